use chrono::Utc;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Item, Order, OrderState};

fn bench_new_order_with_items(c: &mut Criterion) {
    c.bench_function("domain/new_order_with_items", |b| {
        b.iter(|| {
            let now = Utc::now();
            let mut order = Order::new("c3fdab1b-3c06-4db2-9edc-4760a2429462", now);
            for i in 0..10 {
                order
                    .add_item(Item::new(format!("item-{i}"), "Burger", 1), now)
                    .unwrap();
            }
            order
        });
    });
}

fn bench_full_lifecycle(c: &mut Criterion) {
    c.bench_function("domain/full_lifecycle", |b| {
        b.iter(|| {
            let now = Utc::now();
            let mut order = Order::new("c3fdab1b-3c06-4db2-9edc-4760a2429462", now);
            order.update_state(OrderState::Processing, now).unwrap();
            order.update_state(OrderState::Completed, now).unwrap();
            order.update_state(OrderState::Delivered, now).unwrap();
            order
        });
    });
}

fn bench_state_name_lookup(c: &mut Criterion) {
    c.bench_function("domain/state_from_name", |b| {
        b.iter(|| {
            for name in ["Received", "Processing", "Completed", "Delivered", "garbage"] {
                std::hint::black_box(OrderState::from_name(name));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_new_order_with_items,
    bench_full_lifecycle,
    bench_state_name_lookup
);
criterion_main!(benches);

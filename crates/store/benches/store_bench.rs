use chrono::Utc;
use criterion::{Criterion, criterion_group, criterion_main};
use store::{
    BuyerId, InMemoryStore, InventoryStore, Money, NewOrder, NewOrderLine, OrderStatus, Product,
};

fn order_for(product: &Product, number: u64) -> NewOrder {
    let line = NewOrderLine {
        product_id: product.id,
        quantity: 1,
        unit_price: product.price,
        subtotal: product.price,
    };
    NewOrder {
        buyer_id: BuyerId::new(1),
        order_number: format!("PED-{number:06}"),
        created_at: Utc::now(),
        status: OrderStatus::Pending,
        total: product.price,
        comment: None,
        delivery_address: None,
        lines: vec![line],
    }
}

fn bench_decrement_and_commit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let product = rt.block_on(store.insert_product("Widget", Money::from_cents(100), u32::MAX));

    c.bench_function("store/decrement_and_commit", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut tx = store.begin().await.unwrap();
                tx.decrement_stock(product.id, 1).await.unwrap();
                tx.commit().await.unwrap();
            });
        });
    });
}

fn bench_full_order_unit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let product = rt.block_on(store.insert_product("Widget", Money::from_cents(100), u32::MAX));
    let mut next = 0u64;

    c.bench_function("store/read_number_save_decrement_commit", |b| {
        b.iter(|| {
            next += 1;
            let number = next;
            rt.block_on(async {
                let mut tx = store.begin().await.unwrap();
                tx.get_product(product.id).await.unwrap();
                tx.last_order_number().await.unwrap();
                tx.save_order(order_for(&product, number)).await.unwrap();
                tx.decrement_stock(product.id, 1).await.unwrap();
                tx.commit().await.unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_decrement_and_commit, bench_full_order_unit);
criterion_main!(benches);

use common::{BuyerId, Money, Product, ProductId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{CreateOrderRequest, OrderAssembler, OrderNumber, OrderService, ProductSnapshot};
use store::InMemoryStore;

const BENCH_STOCK: u32 = u32::MAX;

async fn seeded_service(
    products: usize,
) -> (OrderService<InMemoryStore>, BuyerId, Vec<ProductId>) {
    let store = InMemoryStore::new();
    let buyer = store
        .insert_buyer("Bench Buyer", "bench@example.com", true)
        .await;
    let mut ids = Vec::with_capacity(products);
    for i in 0..products {
        let product = store
            .insert_product(
                format!("Product {i}"),
                Money::from_cents(100 + i as i64),
                BENCH_STOCK,
            )
            .await;
        ids.push(product.id);
    }
    (OrderService::new(store), buyer.id, ids)
}

fn bench_create_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (service, buyer, products) = rt.block_on(seeded_service(1));

    c.bench_function("domain/create_order_1_line", |b| {
        b.iter(|| {
            rt.block_on(async {
                let request = CreateOrderRequest::new(buyer).with_line(products[0], 1);
                service.create_order(request).await.unwrap();
            });
        });
    });
}

fn bench_create_order_many_lines(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (service, buyer, products) = rt.block_on(seeded_service(20));

    c.bench_function("domain/create_order_20_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                let request = products
                    .iter()
                    .fold(CreateOrderRequest::new(buyer), |req, id| {
                        req.with_line(*id, 1)
                    });
                service.create_order(request).await.unwrap();
            });
        });
    });
}

fn bench_assemble(c: &mut Criterion) {
    let snapshot: ProductSnapshot = (1..=50)
        .map(|i| Product {
            id: ProductId::new(i),
            name: format!("Product {i}"),
            price: Money::from_cents(100 * i),
            stock: 1_000,
            active: true,
        })
        .collect();
    let request = (1..=50).fold(CreateOrderRequest::new(BuyerId::new(1)), |req, i| {
        req.with_line(ProductId::new(i), 2)
    });
    let assembler = OrderAssembler::new();

    c.bench_function("domain/assemble_50_lines", |b| {
        b.iter(|| assembler.assemble(&request, &snapshot).unwrap());
    });
}

fn bench_next_order_number(c: &mut Criterion) {
    c.bench_function("domain/next_order_number", |b| {
        b.iter(|| OrderNumber::next_after(Some("PED-004217")).unwrap());
    });
}

criterion_group!(
    benches,
    bench_create_order,
    bench_create_order_many_lines,
    bench_assemble,
    bench_next_order_number,
);
criterion_main!(benches);

//! Billing correctness and settlement semantics

use rand::Rng;
use rust_decimal::Decimal;

use super::*;

#[test]
fn bill_uses_price_snapshots_not_current_menu() {
    let (engine, catalog, _) = engine_with_menu();
    let order = engine.open_table("T1", &waiter()).unwrap();
    engine.store().add_item(&order.id, "burger", 2, None, &waiter()).unwrap();

    catalog.set_price("burger", dec("14.00"));

    // Existing item billed at the add-time price
    let bill = engine.billing().unpaid_total("T1").unwrap();
    assert_eq!(bill.total_amount, dec("18.00"));

    // New items pick up the new price
    engine.store().add_item(&order.id, "burger", 1, None, &waiter()).unwrap();
    let bill = engine.billing().unpaid_total("T1").unwrap();
    assert_eq!(bill.total_amount, dec("32.00"));
}

#[test]
fn settle_twice_settles_once() {
    let (engine, _, _) = engine_with_menu();
    let order = engine.open_table("T1", &waiter()).unwrap();
    engine.store().add_item(&order.id, "burger", 2, None, &waiter()).unwrap();

    let first = engine.billing().settle_table("T1", &cashier()).unwrap();
    assert_eq!(first.settled_amount, dec("18.00"));

    let second = engine.billing().settle_table("T1", &cashier()).unwrap();
    assert_eq!(second.settled_amount, Decimal::ZERO);
    assert!(second.settled_order_ids.is_empty());
}

#[test]
fn orders_after_settlement_are_a_new_bill() {
    let (engine, _, _) = engine_with_menu();
    let order = engine.open_table("T1", &waiter()).unwrap();
    engine.store().add_item(&order.id, "burger", 1, None, &waiter()).unwrap();
    engine.billing().settle_table("T1", &cashier()).unwrap();

    // The settled order is closed to the next round
    let next = engine.open_table("T1", &waiter()).unwrap();
    assert_ne!(next.id, order.id);
    engine.store().add_item(&next.id, "mojito", 1, None, &waiter()).unwrap();

    let bill = engine.billing().unpaid_total("T1").unwrap();
    assert_eq!(bill.orders.len(), 1);
    assert_eq!(bill.total_amount, dec("6.50"));
}

#[test]
fn multi_order_bill_spans_the_whole_session() {
    let (engine, _, _) = engine_with_menu();

    // First round, sent to the kitchen
    let first = engine.open_table("T1", &waiter()).unwrap();
    engine.store().add_item(&first.id, "burger", 1, None, &waiter()).unwrap();
    engine.store().submit_order(&first.id, &waiter()).unwrap();

    // Second round on the same unsettled table
    let second = engine.open_table("T1", &waiter()).unwrap();
    assert_ne!(second.id, first.id);
    engine.store().add_item(&second.id, "flan", 2, None, &waiter()).unwrap();

    let bill = engine.billing().unpaid_total("T1").unwrap();
    assert_eq!(bill.orders.len(), 2);
    assert_eq!(bill.total_amount, dec("18.00"));

    let settlement = engine.billing().settle_table("T1", &cashier()).unwrap();
    assert_eq!(settlement.settled_order_ids.len(), 2);
    assert_eq!(settlement.settled_amount, dec("18.00"));
}

#[test]
fn randomized_carts_always_sum_exactly() {
    let (engine, _, _) = engine_with_menu();
    let menu = [
        ("burger", dec("9.00")),
        ("fries", dec("3.50")),
        ("mojito", dec("6.50")),
        ("flan", dec("4.50")),
        ("soup", dec("5.00")),
    ];
    let mut rng = rand::thread_rng();

    for round in 0..20 {
        let table_id = format!("R{round}");
        let order = engine.open_table(&table_id, &waiter()).unwrap();
        let mut expected = Decimal::ZERO;
        for _ in 0..rng.gen_range(1..=8) {
            let (menu_item_id, price) = menu[rng.gen_range(0..menu.len())];
            let qty = rng.gen_range(1..=5);
            engine
                .store()
                .add_item(&order.id, menu_item_id, qty, None, &waiter())
                .unwrap();
            expected += price * Decimal::from(qty);
        }

        let bill = engine.billing().unpaid_total(&table_id).unwrap();
        assert_eq!(bill.total_amount, expected, "table {table_id}");

        let settlement = engine.billing().settle_table(&table_id, &cashier()).unwrap();
        assert_eq!(settlement.settled_amount, expected, "table {table_id}");
    }
}

//! Happy-path and state-machine flows

use shared::queue::{PrepStatus, Station};

use super::*;
use crate::common::FulfillmentError;

#[test]
fn burger_from_cart_to_settled_bill() {
    let (engine, _, tables) = engine_with_menu();

    let order = engine.open_table("T1", &waiter()).unwrap();
    assert!(!tables.is_available("T1"));

    engine
        .store()
        .add_item(&order.id, "burger", 2, None, &waiter())
        .unwrap();
    let entries = engine.store().submit_order(&order.id, &waiter()).unwrap();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.station, Station::Main);

    // Ticket shows up on the main board
    let board = engine.kitchen().station_board(Station::Main).unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].qty, 2);

    engine
        .kitchen()
        .start(&entry.id, PrepStatus::Queued, &cook())
        .unwrap();
    engine
        .kitchen()
        .finish(&entry.id, PrepStatus::Prepping, &cook())
        .unwrap();

    // Done cooking: off the station board, on the serving board
    assert!(engine.kitchen().station_board(Station::Main).unwrap().is_empty());
    let serving = engine.kitchen().serving_board().unwrap();
    assert_eq!(serving.len(), 1);

    engine
        .kitchen()
        .serve(&entry.id, PrepStatus::Ready, &cook())
        .unwrap();
    assert!(engine.kitchen().serving_board().unwrap().is_empty());

    let bill = engine.billing().unpaid_total("T1").unwrap();
    assert_eq!(bill.total_amount, dec("18.00"));

    let settlement = engine.billing().settle_table("T1", &cashier()).unwrap();
    assert_eq!(settlement.settled_amount, dec("18.00"));
    assert!(tables.is_available("T1"));
}

#[test]
fn items_fan_out_to_their_stations() {
    let (engine, _, _) = engine_with_menu();
    let order = engine.open_table("T2", &waiter()).unwrap();
    engine.store().add_item(&order.id, "burger", 1, None, &waiter()).unwrap();
    engine.store().add_item(&order.id, "mojito", 1, None, &waiter()).unwrap();
    engine.store().add_item(&order.id, "flan", 1, None, &waiter()).unwrap();
    engine.store().add_item(&order.id, "soup", 1, None, &waiter()).unwrap();

    engine.store().submit_order(&order.id, &waiter()).unwrap();

    // Unannotated soup lands on main alongside the burger
    assert_eq!(engine.kitchen().station_board(Station::Main).unwrap().len(), 2);
    assert_eq!(engine.kitchen().station_board(Station::Bar).unwrap().len(), 1);
    assert_eq!(engine.kitchen().station_board(Station::Dessert).unwrap().len(), 1);
}

#[test]
fn status_never_moves_backwards() {
    let (engine, _, _) = engine_with_menu();
    let order = engine.open_table("T3", &waiter()).unwrap();
    engine.store().add_item(&order.id, "burger", 1, None, &waiter()).unwrap();
    let entries = engine.store().submit_order(&order.id, &waiter()).unwrap();
    let entry_id = &entries[0].id;

    // Serving straight from the queue skips required steps
    let err = engine
        .kitchen()
        .serve(entry_id, PrepStatus::Queued, &cook())
        .unwrap_err();
    assert!(matches!(err, FulfillmentError::InvalidTransition { .. }));

    engine.kitchen().start(entry_id, PrepStatus::Queued, &cook()).unwrap();
    engine.kitchen().finish(entry_id, PrepStatus::Prepping, &cook()).unwrap();
    engine.kitchen().serve(entry_id, PrepStatus::Ready, &cook()).unwrap();

    // Terminal: no transition leaves served
    for attempt in [
        engine.kitchen().start(entry_id, PrepStatus::Served, &cook()),
        engine.kitchen().finish(entry_id, PrepStatus::Served, &cook()),
        engine.kitchen().cancel(entry_id, PrepStatus::Served, None, &cook()),
    ] {
        assert!(matches!(
            attempt.unwrap_err(),
            FulfillmentError::InvalidTransition { .. }
        ));
    }
}

#[test]
fn vanished_menu_item_is_dropped_at_submit() {
    let (engine, catalog, _) = engine_with_menu();
    let order = engine.open_table("T4", &waiter()).unwrap();
    engine.store().add_item(&order.id, "burger", 1, None, &waiter()).unwrap();
    let doomed = engine
        .store()
        .add_item(&order.id, "soup", 1, None, &waiter())
        .unwrap();
    catalog.remove("soup");

    let entries = engine.store().submit_order(&order.id, &waiter()).unwrap();
    assert_eq!(entries.len(), 1);

    let items = engine.store().get_items(&order.id).unwrap();
    let soup = items.iter().find(|i| i.id == doomed.id).unwrap();
    assert_eq!(soup.status, PrepStatus::Cancelled);
    assert!(soup.cancel_reason.is_some());

    // Only the burger bills
    let bill = engine.billing().unpaid_total("T4").unwrap();
    assert_eq!(bill.total_amount, dec("9.00"));
}

#[test]
fn staff_cancel_mid_prep_clears_board_and_bill() {
    let (engine, _, _) = engine_with_menu();
    let order = engine.open_table("T5", &waiter()).unwrap();
    let item = engine
        .store()
        .add_item(&order.id, "mojito", 2, None, &waiter())
        .unwrap();
    let entries = engine.store().submit_order(&order.id, &waiter()).unwrap();

    engine
        .kitchen()
        .start(&entries[0].id, PrepStatus::Queued, &cook())
        .unwrap();

    engine
        .store()
        .cancel_item(&item.id, Some("guest left".into()), &waiter())
        .unwrap();

    assert!(engine.kitchen().station_board(Station::Bar).unwrap().is_empty());
    let bill = engine.billing().unpaid_total("T5").unwrap();
    assert_eq!(bill.total_amount, dec("0.00"));
}

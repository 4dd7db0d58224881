//! Tests for the `#[derive(Table)]` macro output.
//!
//! These tests verify that the derive macro generates:
//! - a `TableSchema` implementation with the right descriptor
//! - a `{Struct}Table` handle with column accessors and aliasing

mod common;

use common::{Order, OrderTable, User, UserTable};
use sqlforge_core::ast::{DataType, TableExpr};
use sqlforge_core::schema::{ColumnDef, Table, TableSchema};
use sqlforge_core::types::ValueType;

#[allow(dead_code)]
#[derive(sqlforge_derive::Table)]
struct OrderItem {
    id: i64,
    #[column(name = "qty")]
    quantity: u32,
    picture: Option<Vec<u8>>,
}

fn column_names(def: &sqlforge_core::schema::TableDef) -> Vec<&str> {
    def.columns().iter().map(ColumnDef::name).collect()
}

#[test]
fn test_table_names() {
    assert_eq!(User::NAME, "users");
    assert_eq!(Order::NAME, "orders");
    assert_eq!(OrderItem::NAME, "order_item");
}

#[test]
fn test_columns_in_declaration_order() {
    assert_eq!(
        column_names(&User::definition()),
        vec!["id", "name", "money", "nick", "created_at"]
    );
    assert_eq!(column_names(&OrderItem::definition()), vec!["id", "qty", "picture"]);
}

#[test]
fn test_column_flags() {
    let def = User::definition();
    let id = def.find("id").unwrap();
    assert!(id.is_primary_key());
    assert!(id.is_auto_increment());
    assert!(!id.is_required_for_insert());

    let name = def.find("name").unwrap();
    assert_eq!(name.value_type(), ValueType::of(DataType::Text));
    assert!(name.is_required_for_insert());

    assert!(def.find("money").unwrap().has_default());
    assert!(def.find("created_at").unwrap().has_default());
    assert_eq!(
        def.find("created_at").unwrap().value_type().data_type,
        DataType::Timestamp
    );
}

#[test]
fn test_nullability() {
    let nick = User::definition().find("nick").cloned().unwrap();
    assert_eq!(nick.value_type(), ValueType::nullable(DataType::Text));

    let note = Order::definition().find("note").cloned().unwrap();
    assert!(note.value_type().nullable);

    let picture = OrderItem::definition().find("picture").cloned().unwrap();
    assert_eq!(picture.value_type(), ValueType::nullable(DataType::Blob));
    let quantity = OrderItem::definition().find("qty").cloned().unwrap();
    assert_eq!(quantity.value_type(), ValueType::of(DataType::UnsignedIntegral));
}

#[test]
fn test_handle_accessors() {
    let users = User::table();
    assert_eq!(users.id().qualified_name(), "users.id");
    assert_eq!(users.created().name(), "created_at");
    assert_eq!(users.table(), &Table::of::<User>());
    assert_eq!(UserTable::default(), users);
}

#[test]
fn test_aliased_handle() {
    let buyers = User::table().as_("buyers");
    assert_eq!(buyers.table().name(), "users");
    assert_eq!(buyers.table().reference_name(), "buyers");
    assert_eq!(buyers.name().qualified_name(), "buyers.name");
}

#[test]
fn test_handle_conversions() {
    let orders = OrderTable::new();
    let table: Table = (&orders).into();
    assert_eq!(table.name(), "orders");
    let expr = TableExpr::from(&orders);
    assert_eq!(expr.reference_names(), vec!["orders"]);
}

use crate::application::service::PurchaseReceipt;
use crate::application::ApplicationError;
use crate::domain::model::{Product, Purchase};
use chrono::SecondsFormat;

pub const MENU: &str = "\
Inventory Management System
1. Add Product
2. Update Product Quantity
3. Make Purchase
4. Display Products
5. Display Purchase History
6. Exit";

pub const NO_PRODUCTS: &str = "No products available.";
pub const NO_PURCHASES: &str = "No purchase history available.";

/// 商品一覧の1行
pub fn product_line(product: &Product) -> String {
    format!(
        "SKU: {}, Name: {}, Price: ${}, Quantity: {}",
        product.sku(),
        product.name(),
        product.price(),
        product.quantity()
    )
}

/// 購入履歴の1行
pub fn purchase_line(purchase: &Purchase) -> String {
    format!(
        "Transaction ID: {}, SKU: {}, Quantity: {}, Total Price: ${}, Timestamp: {}",
        purchase.transaction_id(),
        purchase.sku(),
        purchase.quantity(),
        purchase.total_price(),
        purchase
            .timestamp()
            .to_rfc3339_opts(SecondsFormat::Micros, true)
    )
}

pub fn product_added(product: &Product) -> String {
    format!("Product '{}' added successfully.", product.name())
}

pub fn quantity_updated(product: &Product) -> String {
    format!(
        "Quantity for product SKU {} updated successfully. New quantity: {}",
        product.sku(),
        product.quantity()
    )
}

pub fn purchase_completed(receipt: &PurchaseReceipt) -> String {
    format!(
        "Purchase successful. {}x {} sold. Total: ${} (transaction {}, {} left in stock)",
        receipt.quantity,
        receipt.product_name,
        receipt.total_price,
        receipt.transaction_id,
        receipt.remaining_quantity
    )
}

/// エラーの種類ごとに異なるメッセージを返す
pub fn error_message(err: &ApplicationError) -> String {
    match err {
        ApplicationError::DuplicateKey(sku) => format!("Product with SKU {} already exists.", sku),
        ApplicationError::NotFound(sku) => format!("Product with SKU {} not found.", sku),
        ApplicationError::InsufficientStock {
            sku,
            requested,
            available,
        } => format!(
            "Insufficient stock for product SKU {} (requested {}, available {}).",
            sku, requested, available
        ),
        ApplicationError::InvalidInput(msg) => format!("Invalid input: {}.", msg),
        ApplicationError::StorageFailure(msg) => {
            format!("Storage error, the operation was not completed: {}", msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Price, ProductName, Sku, TransactionId};
    use chrono::{TimeZone, Utc};

    fn widget() -> Product {
        Product::new(
            Sku::new("A1").unwrap(),
            ProductName::new("Widget").unwrap(),
            Price::parse("9.99").unwrap(),
            10,
        )
    }

    #[test]
    fn test_product_line() {
        assert_eq!(
            product_line(&widget()),
            "SKU: A1, Name: Widget, Price: $9.99, Quantity: 10"
        );
    }

    #[test]
    fn test_purchase_line() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let purchase = Purchase::record(
            TransactionId::from_instant(at),
            Sku::new("A1").unwrap(),
            3,
            Price::parse("9.99").unwrap(),
            at,
        )
        .unwrap();

        assert_eq!(
            purchase_line(&purchase),
            "Transaction ID: txn20240501123000000000, SKU: A1, Quantity: 3, \
             Total Price: $29.97, Timestamp: 2024-05-01T12:30:00.000000Z"
        );
    }

    #[test]
    fn test_error_messages_are_distinct() {
        let errors = [
            ApplicationError::DuplicateKey("A1".to_string()),
            ApplicationError::NotFound("A1".to_string()),
            ApplicationError::InsufficientStock {
                sku: "A1".to_string(),
                requested: 100,
                available: 7,
            },
            ApplicationError::InvalidInput("A1".to_string()),
            ApplicationError::StorageFailure("A1".to_string()),
        ];
        let messages: Vec<String> = errors.iter().map(error_message).collect();

        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(messages[1], "Product with SKU A1 not found.");
    }
}

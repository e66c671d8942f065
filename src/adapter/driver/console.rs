use crate::adapter::driver::console_view;
use crate::application::service::{
    CatalogQueryService, InventoryApplicationService, LedgerQueryService,
};
use rust_decimal::Decimal;
use std::io;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const NON_NEGATIVE: &str = "a non-negative whole number";

/// コマンド実行後にループを続けるかどうか
enum Flow {
    Continue,
    Exit,
}

/// 対話型のコンソールシェル
/// メニューを表示し、選ばれたコマンドをアプリケーションサービスに委譲する
pub struct ConsoleShell<R, W> {
    input: R,
    output: W,
    inventory_service: Arc<InventoryApplicationService>,
    catalog_query_service: Arc<CatalogQueryService>,
    ledger_query_service: Arc<LedgerQueryService>,
}

impl<R, W> ConsoleShell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(
        input: R,
        output: W,
        inventory_service: Arc<InventoryApplicationService>,
        catalog_query_service: Arc<CatalogQueryService>,
        ledger_query_service: Arc<LedgerQueryService>,
    ) -> Self {
        Self {
            input,
            output,
            inventory_service,
            catalog_query_service,
            ledger_query_service,
        }
    }

    /// 出力先を取り出す
    pub fn into_output(self) -> W {
        self.output
    }

    /// 終了が選ばれるか入力が尽きるまでメニューを繰り返す
    /// エラーはメッセージとして表示し、ループは続ける
    pub async fn run(&mut self) -> io::Result<()> {
        loop {
            self.say("").await?;
            self.say(console_view::MENU).await?;

            let Some(choice) = self.prompt("Enter your choice: ").await? else {
                self.say("Exiting...").await?;
                return Ok(());
            };

            let flow = match choice.trim() {
                "1" => self.add_product().await?,
                "2" => self.update_quantity().await?,
                "3" => self.make_purchase().await?,
                "4" => self.display_products().await?,
                "5" => self.display_purchase_history().await?,
                "6" => Flow::Exit,
                other => {
                    tracing::debug!(choice = other, "unknown menu choice");
                    self.say("Invalid choice. Please try again.").await?;
                    Flow::Continue
                }
            };

            if let Flow::Exit = flow {
                self.say("Exiting...").await?;
                return Ok(());
            }
        }
    }

    async fn add_product(&mut self) -> io::Result<Flow> {
        let Some(sku) = self.prompt("Enter SKU: ").await? else {
            return Ok(Flow::Exit);
        };
        let Some(name) = self.prompt("Enter product name: ").await? else {
            return Ok(Flow::Exit);
        };
        let Some(price) = self.prompt_number::<Decimal>("Enter price: ", "price", "a decimal number").await? else {
            return Ok(Flow::Exit);
        };
        let Some(price) = price else {
            return Ok(Flow::Continue);
        };
        let Some(quantity) = self
            .prompt_number::<u32>("Enter quantity: ", "quantity", NON_NEGATIVE)
            .await?
        else {
            return Ok(Flow::Exit);
        };
        let Some(quantity) = quantity else {
            return Ok(Flow::Continue);
        };

        let message = match self
            .inventory_service
            .add_product(&sku, &name, price, quantity)
            .await
        {
            Ok(product) => console_view::product_added(&product),
            Err(e) => console_view::error_message(&e),
        };
        self.say(&message).await?;
        Ok(Flow::Continue)
    }

    async fn update_quantity(&mut self) -> io::Result<Flow> {
        let Some(sku) = self.prompt("Enter SKU: ").await? else {
            return Ok(Flow::Exit);
        };
        let Some(delta) = self
            .prompt_number::<i64>(
                "Enter quantity to add/subtract: ",
                "quantity",
                "a whole number",
            )
            .await?
        else {
            return Ok(Flow::Exit);
        };
        let Some(delta) = delta else {
            return Ok(Flow::Continue);
        };

        let message = match self.inventory_service.adjust_quantity(&sku, delta).await {
            Ok(product) => console_view::quantity_updated(&product),
            Err(e) => console_view::error_message(&e),
        };
        self.say(&message).await?;
        Ok(Flow::Continue)
    }

    async fn make_purchase(&mut self) -> io::Result<Flow> {
        let Some(sku) = self.prompt("Enter SKU: ").await? else {
            return Ok(Flow::Exit);
        };
        let Some(quantity) = self
            .prompt_number::<u32>("Enter quantity to purchase: ", "quantity", NON_NEGATIVE)
            .await?
        else {
            return Ok(Flow::Exit);
        };
        let Some(quantity) = quantity else {
            return Ok(Flow::Continue);
        };

        let message = match self.inventory_service.make_purchase(&sku, quantity).await {
            Ok(receipt) => console_view::purchase_completed(&receipt),
            Err(e) => console_view::error_message(&e),
        };
        self.say(&message).await?;
        Ok(Flow::Continue)
    }

    async fn display_products(&mut self) -> io::Result<Flow> {
        match self.catalog_query_service.list_products().await {
            Ok(products) if products.is_empty() => self.say(console_view::NO_PRODUCTS).await?,
            Ok(products) => {
                self.say("Product Catalog:").await?;
                for product in &products {
                    self.say(&console_view::product_line(product)).await?;
                }
            }
            Err(e) => self.say(&console_view::error_message(&e)).await?,
        }
        Ok(Flow::Continue)
    }

    async fn display_purchase_history(&mut self) -> io::Result<Flow> {
        match self.ledger_query_service.list_transactions().await {
            Ok(purchases) if purchases.is_empty() => {
                self.say(console_view::NO_PURCHASES).await?
            }
            Ok(purchases) => {
                self.say("Purchase History:").await?;
                for purchase in &purchases {
                    self.say(&console_view::purchase_line(purchase)).await?;
                }
            }
            Err(e) => self.say(&console_view::error_message(&e)).await?,
        }
        Ok(Flow::Continue)
    }

    /// 数値を入力させる
    /// 入力が尽きたら `None`、解析に失敗したらメッセージを表示して `Some(None)`
    ///
    /// # Arguments
    /// * `expected` - 受け付ける値の説明（エラーメッセージに使う）
    async fn prompt_number<T: FromStr>(
        &mut self,
        label: &str,
        field: &str,
        expected: &str,
    ) -> io::Result<Option<Option<T>>> {
        let Some(raw) = self.prompt(label).await? else {
            return Ok(None);
        };
        match raw.trim().parse::<T>() {
            Ok(value) => Ok(Some(Some(value))),
            Err(_) => {
                self.say(&format!("Invalid {}: '{}' must be {}.", field, raw.trim(), expected))
                    .await?;
                Ok(Some(None))
            }
        }
    }

    /// プロンプトを表示して1行読む
    /// 入力の終端に達したら `None`
    async fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        self.output.write_all(label.as_bytes()).await?;
        self.output.flush().await?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
    }

    async fn say(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await
    }
}

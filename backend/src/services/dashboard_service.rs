use pharmacy_shared::{MedicineResponse, OrderResponse, LOW_STOCK_THRESHOLD};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::error::AppError;
use crate::models::medicine::{Medicine, MedicineFilter, MedicineSort, StockBand};
use crate::models::order::{Order, OrderFilter, OrderItem};
use crate::utils::currency::format_rupees;

const RECENT_ORDERS: i64 = 10;
const LOW_STOCK_LISTED: i64 = 10;

#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct DashboardCounts {
    pub total_medicines: i64,
    pub active_medicines: i64,
    pub out_of_stock: i64,
    pub low_stock: i64,
    pub total_orders: i64,
    pub pending_orders: i64,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    #[serde(flatten)]
    pub counts: DashboardCounts,
    pub total_revenue_display: String,
    pub recent_orders: Vec<OrderResponse>,
    pub low_stock_medicines: Vec<MedicineResponse>,
}

/// Back-office overview numbers
#[derive(Clone)]
pub struct DashboardService {
    db_pool: PgPool,
}

impl DashboardService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn overview(&self) -> Result<Dashboard, AppError> {
        // Revenue counts delivered orders only
        let counts = sqlx::query_as::<_, DashboardCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM medicines) AS total_medicines,
                (SELECT COUNT(*) FROM medicines WHERE is_active = TRUE) AS active_medicines,
                (SELECT COUNT(*) FROM medicines WHERE stock_quantity = 0) AS out_of_stock,
                (SELECT COUNT(*) FROM medicines WHERE stock_quantity > 0 AND stock_quantity <= $1) AS low_stock,
                (SELECT COUNT(*) FROM orders) AS total_orders,
                (SELECT COUNT(*) FROM orders WHERE status = 'PENDING') AS pending_orders,
                (SELECT COALESCE(SUM(total_amount), 0) FROM orders WHERE status = 'DELIVERED') AS total_revenue
            "#,
        )
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_one(&self.db_pool)
        .await?;

        let (orders, _) = Order::search(
            &self.db_pool,
            &OrderFilter {
                limit: RECENT_ORDERS,
                ..OrderFilter::default()
            },
        )
        .await?;
        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let items = OrderItem::for_orders(&self.db_pool, &ids).await?;
        let recent_orders = orders
            .iter()
            .map(|order| {
                let own: Vec<OrderItem> = items.iter().filter(|i| i.order_id == order.id).cloned().collect();
                order.to_response(&own)
            })
            .collect();

        let (low_stock, _) = Medicine::search(
            &self.db_pool,
            &MedicineFilter {
                stock_band: Some(StockBand::LowStock),
                sort: MedicineSort::Name,
                limit: LOW_STOCK_LISTED,
                ..MedicineFilter::default()
            },
        )
        .await?;

        Ok(Dashboard {
            total_revenue_display: format_rupees(counts.total_revenue),
            counts,
            recent_orders,
            low_stock_medicines: low_stock.iter().map(Medicine::to_response).collect(),
        })
    }
}

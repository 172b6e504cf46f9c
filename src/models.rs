pub const STATUS_PENDING: &str = "pending";
pub const STATUS_CONFIRMED: &str = "confirmed";
pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_CANCELLED: &str = "cancelled";

pub const BOOKING_STATUSES: [&str; 5] = [
    STATUS_PENDING,
    STATUS_CONFIRMED,
    STATUS_IN_PROGRESS,
    STATUS_COMPLETED,
    STATUS_CANCELLED,
];

pub const BOX_STANDARD: &str = "standard";
pub const BOX_PREMIUM: &str = "premium";

pub const BOX_TYPES: [&str; 2] = [BOX_STANDARD, BOX_PREMIUM];

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_staff: i64,
    pub active: i64,
    pub created_at: String,
}

impl UserRow {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerRow {
    pub id: String,
    pub user_id: String,
    pub phone: String,
    pub car_model: String,
    pub car_number: String,
    pub discount: i64,
    pub notes: String,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceCategoryRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub sort_order: i64,
}

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceRow {
    pub id: String,
    pub category_id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub duration_minutes: i64,
    pub active: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PositionRow {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BoxRow {
    pub id: String,
    pub number: i64,
    pub box_type: String,
    pub capacity: i64,
    pub active: i64,
}

/// Booking joined with the names the pages actually show. Employee and box
/// come through LEFT JOINs since both references are nullable.
#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingDetailRow {
    pub id: String,
    pub customer_id: String,
    pub service_id: String,
    pub employee_id: Option<String>,
    pub box_id: Option<String>,
    pub booking_date: String,
    pub booking_time: String,
    pub status: String,
    pub total_price: String,
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
    pub service_name: String,
    pub customer_name: String,
    pub employee_name: Option<String>,
    pub box_number: Option<i64>,
}

use std::{env, fs, path::Path, str::FromStr};

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use crate::{
    auth::{hash_password, new_id},
    models::{BookingDetailRow, BoxRow, CustomerRow, ServiceRow, STATUS_PENDING},
    pricing,
};

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = if let Some(path) = db_url.strip_prefix("sqlite://") {
        Some(path)
    } else if let Some(path) = db_url.strip_prefix("sqlite:") {
        Some(path)
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    let db_path = Path::new(path);
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn parse_price(raw: &str) -> Result<Decimal, sqlx::Error> {
    Decimal::from_str(raw).map_err(|_| sqlx::Error::Protocol("invalid stored price".into()))
}

pub async fn fetch_customer_by_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Option<CustomerRow> {
    sqlx::query_as::<_, CustomerRow>(
        r#"SELECT id, user_id, phone, car_model, car_number, discount, notes, created_at
           FROM customers
           WHERE user_id = ?
           LIMIT 1"#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .unwrap_or(None)
}

pub async fn fetch_active_services(pool: &SqlitePool) -> Result<Vec<ServiceRow>, sqlx::Error> {
    sqlx::query_as::<_, ServiceRow>(
        r#"SELECT s.id, s.category_id, s.name, s.description, s.price, s.duration_minutes, s.active
           FROM services s
           JOIN service_categories c ON s.category_id = c.id
           WHERE s.active = 1
           ORDER BY c.sort_order, s.name"#,
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_active_boxes(pool: &SqlitePool) -> Result<Vec<BoxRow>, sqlx::Error> {
    sqlx::query_as::<_, BoxRow>(
        "SELECT id, number, box_type, capacity, active FROM boxes WHERE active = 1 ORDER BY number",
    )
    .fetch_all(pool)
    .await
}

const BOOKING_DETAIL_SELECT: &str = r#"
    SELECT b.id, b.customer_id, b.service_id, b.employee_id, b.box_id,
           b.booking_date, b.booking_time, b.status, b.total_price, b.notes,
           b.created_at, b.updated_at,
           s.name AS service_name,
           cu.username AS customer_name,
           eu.username AS employee_name,
           bx.number AS box_number
    FROM bookings b
    JOIN services s ON b.service_id = s.id
    JOIN customers c ON b.customer_id = c.id
    JOIN users cu ON c.user_id = cu.id
    LEFT JOIN employees e ON b.employee_id = e.id
    LEFT JOIN users eu ON e.user_id = eu.id
    LEFT JOIN boxes bx ON b.box_id = bx.id
"#;

/// Single booking with display names. `customer_scope` restricts the lookup
/// to one customer's bookings; a foreign id then simply comes back as None.
pub async fn fetch_booking_detail(
    pool: &SqlitePool,
    booking_id: &str,
    customer_scope: Option<&str>,
) -> Option<BookingDetailRow> {
    let result = match customer_scope {
        Some(customer_id) => {
            let sql = format!("{BOOKING_DETAIL_SELECT} WHERE b.id = ? AND b.customer_id = ? LIMIT 1");
            sqlx::query_as::<_, BookingDetailRow>(&sql)
                .bind(booking_id)
                .bind(customer_id)
                .fetch_optional(pool)
                .await
        }
        None => {
            let sql = format!("{BOOKING_DETAIL_SELECT} WHERE b.id = ? LIMIT 1");
            sqlx::query_as::<_, BookingDetailRow>(&sql)
                .bind(booking_id)
                .fetch_optional(pool)
                .await
        }
    };
    result.unwrap_or(None)
}

pub async fn fetch_customer_bookings(
    pool: &SqlitePool,
    customer_id: &str,
) -> Result<Vec<BookingDetailRow>, sqlx::Error> {
    let sql = format!(
        "{BOOKING_DETAIL_SELECT} WHERE b.customer_id = ? ORDER BY b.booking_date DESC, b.booking_time DESC"
    );
    sqlx::query_as::<_, BookingDetailRow>(&sql)
        .bind(customer_id)
        .fetch_all(pool)
        .await
}

pub async fn fetch_all_bookings(
    pool: &SqlitePool,
    status_filter: Option<&str>,
) -> Result<Vec<BookingDetailRow>, sqlx::Error> {
    match status_filter {
        Some(status) => {
            let sql = format!(
                "{BOOKING_DETAIL_SELECT} WHERE b.status = ? ORDER BY b.booking_date DESC, b.booking_time DESC"
            );
            sqlx::query_as::<_, BookingDetailRow>(&sql)
                .bind(status)
                .fetch_all(pool)
                .await
        }
        None => {
            let sql = format!(
                "{BOOKING_DETAIL_SELECT} ORDER BY b.booking_date DESC, b.booking_time DESC"
            );
            sqlx::query_as::<_, BookingDetailRow>(&sql).fetch_all(pool).await
        }
    }
}

pub struct NewBooking<'a> {
    pub customer_id: &'a str,
    pub service_id: &'a str,
    pub booking_date: &'a str,
    pub booking_time: &'a str,
    pub notes: &'a str,
}

/// Creates a booking in pending status. `total_price` is derived here, at the
/// write boundary, from the referenced service price and discount tier.
pub async fn insert_booking(pool: &SqlitePool, booking: NewBooking<'_>) -> Result<String, sqlx::Error> {
    let (price, discount) = sqlx::query_as::<_, (String, i64)>(
        "SELECT s.price, c.discount FROM services s, customers c WHERE s.id = ? AND c.id = ?",
    )
    .bind(booking.service_id)
    .bind(booking.customer_id)
    .fetch_one(pool)
    .await?;

    let total = pricing::discounted_price(parse_price(&price)?, discount as u32);

    let booking_id = new_id();
    let timestamp = now();
    sqlx::query(
        r#"INSERT INTO bookings
           (id, customer_id, service_id, booking_date, booking_time, status, total_price, notes, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&booking_id)
    .bind(booking.customer_id)
    .bind(booking.service_id)
    .bind(booking.booking_date)
    .bind(booking.booking_time)
    .bind(STATUS_PENDING)
    .bind(total.to_string())
    .bind(booking.notes)
    .bind(&timestamp)
    .bind(&timestamp)
    .execute(pool)
    .await?;

    Ok(booking_id)
}

/// Re-derives `total_price` from the booking's current service and customer.
/// Runs after every booking update; the column is a derived snapshot, never
/// an independently stored value.
pub async fn refresh_total_price(pool: &SqlitePool, booking_id: &str) -> Result<(), sqlx::Error> {
    let (price, discount) = sqlx::query_as::<_, (String, i64)>(
        r#"SELECT s.price, c.discount
           FROM bookings b
           JOIN services s ON b.service_id = s.id
           JOIN customers c ON b.customer_id = c.id
           WHERE b.id = ?"#,
    )
    .bind(booking_id)
    .fetch_one(pool)
    .await?;

    let total = pricing::discounted_price(parse_price(&price)?, discount as u32);

    sqlx::query("UPDATE bookings SET total_price = ?, updated_at = ? WHERE id = ?")
        .bind(total.to_string())
        .bind(now())
        .bind(booking_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Customer-side edit: service, schedule, and notes. Status is untouched.
pub async fn update_booking_details(
    pool: &SqlitePool,
    booking_id: &str,
    service_id: &str,
    booking_date: &str,
    booking_time: &str,
    notes: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE bookings SET service_id = ?, booking_date = ?, booking_time = ?, notes = ? WHERE id = ?",
    )
    .bind(service_id)
    .bind(booking_date)
    .bind(booking_time)
    .bind(notes)
    .bind(booking_id)
    .execute(pool)
    .await?;

    refresh_total_price(pool, booking_id).await
}

/// Staff-side update: status plus employee/box assignment. No transition
/// guard between statuses; the console may set any of the five freely.
pub async fn update_booking_assignment(
    pool: &SqlitePool,
    booking_id: &str,
    status: &str,
    employee_id: Option<&str>,
    box_id: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE bookings SET status = ?, employee_id = ?, box_id = ? WHERE id = ?")
        .bind(status)
        .bind(employee_id)
        .bind(box_id)
        .bind(booking_id)
        .execute(pool)
        .await?;

    refresh_total_price(pool, booking_id).await
}

pub struct Registration<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password_hash: &'a str,
    pub phone: &'a str,
    pub car_model: &'a str,
    pub car_number: &'a str,
}

/// Creates the user account and its customer profile in one transaction, so
/// a failure on either side leaves nothing behind.
pub async fn register_customer(
    pool: &SqlitePool,
    registration: Registration<'_>,
) -> Result<String, sqlx::Error> {
    let user_id = new_id();
    let timestamp = now();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"INSERT INTO users (id, username, email, first_name, last_name, password_hash, is_staff, active, created_at)
           VALUES (?, ?, ?, ?, ?, ?, 0, 1, ?)"#,
    )
    .bind(&user_id)
    .bind(registration.username)
    .bind(registration.email)
    .bind(registration.first_name)
    .bind(registration.last_name)
    .bind(registration.password_hash)
    .bind(&timestamp)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"INSERT INTO customers (id, user_id, phone, car_model, car_number, discount, notes, created_at)
           VALUES (?, ?, ?, ?, ?, 0, '', ?)"#,
    )
    .bind(new_id())
    .bind(&user_id)
    .bind(registration.phone)
    .bind(registration.car_model)
    .bind(registration.car_number)
    .bind(&timestamp)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(user_id)
}

pub struct NewEmployee<'a> {
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password_hash: &'a str,
    pub position_id: Option<&'a str>,
    pub phone: &'a str,
    pub hire_date: &'a str,
}

/// Staff provisioning mirrors registration: account plus employee profile in
/// one transaction.
pub async fn create_employee(
    pool: &SqlitePool,
    employee: NewEmployee<'_>,
) -> Result<String, sqlx::Error> {
    let user_id = new_id();
    let employee_id = new_id();
    let timestamp = now();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"INSERT INTO users (id, username, email, first_name, last_name, password_hash, is_staff, active, created_at)
           VALUES (?, ?, '', ?, ?, ?, 1, 1, ?)"#,
    )
    .bind(&user_id)
    .bind(employee.username)
    .bind(employee.first_name)
    .bind(employee.last_name)
    .bind(employee.password_hash)
    .bind(&timestamp)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"INSERT INTO employees (id, user_id, position_id, phone, hire_date, active)
           VALUES (?, ?, ?, ?, ?, 1)"#,
    )
    .bind(&employee_id)
    .bind(&user_id)
    .bind(employee.position_id)
    .bind(employee.phone)
    .bind(employee.hire_date)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(employee_id)
}

pub async fn seed_defaults(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    seed_admin(pool).await?;
    seed_catalog(pool).await?;
    seed_boxes(pool).await?;
    Ok(())
}

async fn seed_admin(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let existing = sqlx::query_as::<_, (String,)>("SELECT id FROM users WHERE is_staff = 1 LIMIT 1")
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    let username = env::var("ADMIN_USER").unwrap_or_else(|_| "admin".to_string());
    let password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string());

    if password == "admin" {
        log::warn!("ADMIN_PASSWORD not set. Using default password 'admin'. Set ADMIN_PASSWORD in production.");
    }

    let password_hash =
        hash_password(&password).map_err(|_| sqlx::Error::Protocol("password hash failed".into()))?;

    sqlx::query(
        r#"INSERT INTO users (id, username, email, first_name, last_name, password_hash, is_staff, active, created_at)
           VALUES (?, ?, '', 'Site', 'Admin', ?, 1, 1, ?)"#,
    )
    .bind(new_id())
    .bind(username)
    .bind(password_hash)
    .bind(now())
    .execute(pool)
    .await?;

    Ok(())
}

async fn seed_catalog(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let existing = sqlx::query_as::<_, (String,)>("SELECT id FROM service_categories LIMIT 1")
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let categories = [
        ("Exterior wash", "Bodywork cleaning, rinse and dry.", 1i64, vec![
            ("Express wash", "Quick exterior rinse and foam wash.", "500.00", 20i64),
            ("Full exterior wash", "Foam wash, rims, wax finish.", "1000.00", 40),
        ]),
        ("Interior detailing", "Cabin cleaning and care.", 2, vec![
            ("Vacuum and dust", "Seats, mats and dashboard.", "700.00", 30),
            ("Deep interior detail", "Upholstery shampoo and trim care.", "2500.00", 90),
        ]),
        ("Complete packages", "Inside and out.", 3, vec![
            ("Complex wash", "Full exterior plus cabin refresh.", "1500.00", 60),
        ]),
    ];

    for (name, description, sort_order, services) in categories {
        let category_id = new_id();
        sqlx::query(
            "INSERT INTO service_categories (id, name, description, sort_order) VALUES (?, ?, ?, ?)",
        )
        .bind(&category_id)
        .bind(name)
        .bind(description)
        .bind(sort_order)
        .execute(pool)
        .await?;

        for (service_name, service_description, price, duration) in services {
            sqlx::query(
                r#"INSERT INTO services (id, category_id, name, description, price, duration_minutes, active)
                   VALUES (?, ?, ?, ?, ?, ?, 1)"#,
            )
            .bind(new_id())
            .bind(&category_id)
            .bind(service_name)
            .bind(service_description)
            .bind(price)
            .bind(duration)
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}

async fn seed_boxes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let existing = sqlx::query_as::<_, (String,)>("SELECT id FROM boxes LIMIT 1")
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let boxes = [(1i64, "standard", 2i64), (2, "premium", 1)];
    for (number, box_type, capacity) in boxes {
        sqlx::query(
            "INSERT INTO boxes (id, number, box_type, capacity, active) VALUES (?, ?, ?, ?, 1)",
        )
        .bind(new_id())
        .bind(number)
        .bind(box_type)
        .bind(capacity)
        .execute(pool)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BOOKING_STATUSES;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        run_migrations(&pool).await.expect("migrations");
        pool
    }

    async fn seed_customer(pool: &SqlitePool, username: &str, discount: i64) -> String {
        let user_id = new_id();
        sqlx::query(
            r#"INSERT INTO users (id, username, email, first_name, last_name, password_hash, is_staff, active, created_at)
               VALUES (?, ?, '', '', '', 'x', 0, 1, ?)"#,
        )
        .bind(&user_id)
        .bind(username)
        .bind(now())
        .execute(pool)
        .await
        .unwrap();

        let customer_id = new_id();
        sqlx::query(
            r#"INSERT INTO customers (id, user_id, phone, car_model, car_number, discount, notes, created_at)
               VALUES (?, ?, '+70000000000', '', '', ?, '', ?)"#,
        )
        .bind(&customer_id)
        .bind(&user_id)
        .bind(discount)
        .bind(now())
        .execute(pool)
        .await
        .unwrap();

        customer_id
    }

    async fn seed_service(pool: &SqlitePool, name: &str, price: &str) -> String {
        let category_id = new_id();
        sqlx::query(
            "INSERT INTO service_categories (id, name, description, sort_order) VALUES (?, 'Wash', '', 0)",
        )
        .bind(&category_id)
        .execute(pool)
        .await
        .unwrap();

        let service_id = new_id();
        sqlx::query(
            r#"INSERT INTO services (id, category_id, name, description, price, duration_minutes, active)
               VALUES (?, ?, ?, '', ?, 30, 1)"#,
        )
        .bind(&service_id)
        .bind(&category_id)
        .bind(name)
        .bind(price)
        .execute(pool)
        .await
        .unwrap();

        service_id
    }

    async fn total_price(pool: &SqlitePool, booking_id: &str) -> Decimal {
        let (raw,): (String,) =
            sqlx::query_as("SELECT total_price FROM bookings WHERE id = ?")
                .bind(booking_id)
                .fetch_one(pool)
                .await
                .unwrap();
        Decimal::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn booking_insert_applies_discount() {
        let pool = test_pool().await;
        let customer_id = seed_customer(&pool, "alice", 20).await;
        let service_id = seed_service(&pool, "Complex wash", "1000.00").await;

        let booking_id = insert_booking(
            &pool,
            NewBooking {
                customer_id: &customer_id,
                service_id: &service_id,
                booking_date: "2026-09-01",
                booking_time: "10:00",
                notes: "",
            },
        )
        .await
        .unwrap();

        assert_eq!(total_price(&pool, &booking_id).await, Decimal::from_str("800.00").unwrap());

        let (status,): (String,) = sqlx::query_as("SELECT status FROM bookings WHERE id = ?")
            .bind(&booking_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(status, STATUS_PENDING);
    }

    #[tokio::test]
    async fn resave_picks_up_discount_change() {
        let pool = test_pool().await;
        let customer_id = seed_customer(&pool, "bob", 0).await;
        let service_id = seed_service(&pool, "Express wash", "500.00").await;

        let booking_id = insert_booking(
            &pool,
            NewBooking {
                customer_id: &customer_id,
                service_id: &service_id,
                booking_date: "2026-09-02",
                booking_time: "11:30",
                notes: "",
            },
        )
        .await
        .unwrap();
        assert_eq!(total_price(&pool, &booking_id).await, Decimal::from_str("500.00").unwrap());

        sqlx::query("UPDATE customers SET discount = 15 WHERE id = ?")
            .bind(&customer_id)
            .execute(&pool)
            .await
            .unwrap();

        // Not retroactive: nothing changes until the booking itself is saved.
        assert_eq!(total_price(&pool, &booking_id).await, Decimal::from_str("500.00").unwrap());

        update_booking_details(&pool, &booking_id, &service_id, "2026-09-02", "11:30", "")
            .await
            .unwrap();
        assert_eq!(total_price(&pool, &booking_id).await, Decimal::from_str("425.00").unwrap());
    }

    #[tokio::test]
    async fn deleting_customer_cascades_to_bookings() {
        let pool = test_pool().await;
        let customer_id = seed_customer(&pool, "carol", 5).await;
        let service_id = seed_service(&pool, "Express wash", "500.00").await;

        insert_booking(
            &pool,
            NewBooking {
                customer_id: &customer_id,
                service_id: &service_id,
                booking_date: "2026-09-03",
                booking_time: "09:00",
                notes: "",
            },
        )
        .await
        .unwrap();

        sqlx::query("DELETE FROM customers WHERE id = ?")
            .bind(&customer_id)
            .execute(&pool)
            .await
            .unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn deleting_service_cascades_to_bookings() {
        let pool = test_pool().await;
        let customer_id = seed_customer(&pool, "dave", 0).await;
        let service_id = seed_service(&pool, "Express wash", "500.00").await;

        insert_booking(
            &pool,
            NewBooking {
                customer_id: &customer_id,
                service_id: &service_id,
                booking_date: "2026-09-04",
                booking_time: "12:00",
                notes: "",
            },
        )
        .await
        .unwrap();

        sqlx::query("DELETE FROM services WHERE id = ?")
            .bind(&service_id)
            .execute(&pool)
            .await
            .unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn deleting_employee_and_box_nulls_references() {
        let pool = test_pool().await;
        let customer_id = seed_customer(&pool, "erin", 0).await;
        let service_id = seed_service(&pool, "Express wash", "500.00").await;

        let employee_id = create_employee(
            &pool,
            NewEmployee {
                username: "washer1",
                first_name: "Sam",
                last_name: "Washer",
                password_hash: "x",
                position_id: None,
                phone: "+70000000001",
                hire_date: "2024-01-01",
            },
        )
        .await
        .unwrap();

        let box_id = new_id();
        sqlx::query("INSERT INTO boxes (id, number, box_type, capacity, active) VALUES (?, 7, 'standard', 2, 1)")
            .bind(&box_id)
            .execute(&pool)
            .await
            .unwrap();

        let booking_id = insert_booking(
            &pool,
            NewBooking {
                customer_id: &customer_id,
                service_id: &service_id,
                booking_date: "2026-09-05",
                booking_time: "14:00",
                notes: "",
            },
        )
        .await
        .unwrap();

        update_booking_assignment(&pool, &booking_id, "confirmed", Some(&employee_id), Some(&box_id))
            .await
            .unwrap();

        sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(&employee_id)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("DELETE FROM boxes WHERE id = ?")
            .bind(&box_id)
            .execute(&pool)
            .await
            .unwrap();

        let (employee_ref, box_ref): (Option<String>, Option<String>) =
            sqlx::query_as("SELECT employee_id, box_id FROM bookings WHERE id = ?")
                .bind(&booking_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(employee_ref.is_none());
        assert!(box_ref.is_none());
    }

    #[tokio::test]
    async fn any_status_may_follow_any_other() {
        let pool = test_pool().await;
        let customer_id = seed_customer(&pool, "frank", 0).await;
        let service_id = seed_service(&pool, "Express wash", "500.00").await;

        let booking_id = insert_booking(
            &pool,
            NewBooking {
                customer_id: &customer_id,
                service_id: &service_id,
                booking_date: "2026-09-06",
                booking_time: "16:00",
                notes: "",
            },
        )
        .await
        .unwrap();

        // Walk the set out of order, including cancelled back to confirmed.
        let sequence = ["completed", "pending", "cancelled", "confirmed", "in_progress"];
        for status in sequence {
            assert!(BOOKING_STATUSES.contains(&status));
            update_booking_assignment(&pool, &booking_id, status, None, None)
                .await
                .unwrap();
            let (stored,): (String,) = sqlx::query_as("SELECT status FROM bookings WHERE id = ?")
                .bind(&booking_id)
                .fetch_one(&pool)
                .await
                .unwrap();
            assert_eq!(stored, status);
        }
    }

    #[tokio::test]
    async fn out_of_range_discount_is_rejected_by_storage() {
        let pool = test_pool().await;
        let user_id = new_id();
        sqlx::query(
            r#"INSERT INTO users (id, username, email, first_name, last_name, password_hash, is_staff, active, created_at)
               VALUES (?, 'gina', '', '', '', 'x', 0, 1, ?)"#,
        )
        .bind(&user_id)
        .bind(now())
        .execute(&pool)
        .await
        .unwrap();

        let result = sqlx::query(
            r#"INSERT INTO customers (id, user_id, phone, car_model, car_number, discount, notes, created_at)
               VALUES (?, ?, '+7', '', '', 7, '', ?)"#,
        )
        .bind(new_id())
        .bind(&user_id)
        .bind(now())
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn registration_creates_user_and_customer_atomically() {
        let pool = test_pool().await;

        let user_id = register_customer(
            &pool,
            Registration {
                username: "newcomer",
                email: "newcomer@example.com",
                first_name: "New",
                last_name: "Comer",
                password_hash: "x",
                phone: "+79123456789",
                car_model: "Toyota Camry",
                car_number: "A123AA",
            },
        )
        .await
        .unwrap();

        let customer = fetch_customer_by_user(&pool, &user_id).await.unwrap();
        assert_eq!(customer.phone, "+79123456789");
        assert_eq!(customer.car_model, "Toyota Camry");
        assert_eq!(customer.discount, 0);

        // A duplicate username rolls the whole registration back.
        let err = register_customer(
            &pool,
            Registration {
                username: "newcomer",
                email: "",
                first_name: "",
                last_name: "",
                password_hash: "x",
                phone: "+70000000002",
                car_model: "",
                car_number: "",
            },
        )
        .await;
        assert!(err.is_err());

        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = 'newcomer'")
            .fetch_one(&pool)
            .await
            .unwrap();
        let customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(users, 1);
        assert_eq!(customers, 1);
    }
}

#[cfg(test)]
pub mod tests {
    use bigdecimal::BigDecimal;
    use chrono::Utc;
    use sqlx::postgres::PgPoolOptions;
    use sqlx::PgPool;
    use uuid::Uuid;

    use crate::configuration::get_configuration;
    use crate::routes::user::schemas::UserRole;

    pub async fn get_test_pool() -> PgPool {
        let configuration = get_configuration().expect("Failed to read configuration.");
        PgPoolOptions::new()
            .max_connections(configuration.database.max_connections)
            .connect_lazy_with(configuration.database.test_with_db())
    }

    pub async fn create_test_user(pool: &PgPool, role: UserRole) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO user_account (id, email, full_name, password_hash, role, is_active, \
             email_verified, created_on) VALUES ($1, $2, $3, $4, $5, true, true, $6)",
        )
        .bind(id)
        .bind(format!("{}@example.com", id.simple()))
        .bind("Mai Tran")
        .bind("not-a-real-hash")
        .bind(role)
        .bind(Utc::now())
        .execute(pool)
        .await
        .expect("Failed to insert test user");
        id
    }

    pub async fn create_test_variant(
        pool: &PgPool,
        price: i64,
        discount_price: Option<i64>,
        stock: i32,
    ) -> Uuid {
        let product_id = Uuid::new_v4();
        sqlx::query("INSERT INTO product (id, name, brand, created_on) VALUES ($1, $2, $3, $4)")
            .bind(product_id)
            .bind("Rose Water Toner")
            .bind("Petal")
            .bind(Utc::now())
            .execute(pool)
            .await
            .expect("Failed to insert test product");
        let variant_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO product_type (id, product_id, variant_name, price, discount_price, \
             stock, sold, created_on) VALUES ($1, $2, $3, $4, $5, $6, 0, $7)",
        )
        .bind(variant_id)
        .bind(product_id)
        .bind("200ml")
        .bind(BigDecimal::from(price))
        .bind(discount_price.map(BigDecimal::from))
        .bind(stock)
        .bind(Utc::now())
        .execute(pool)
        .await
        .expect("Failed to insert test variant");
        variant_id
    }

    pub async fn create_test_voucher(
        pool: &PgPool,
        discount: i64,
        min_order_amount: Option<i64>,
        max_discount: Option<i64>,
        quantity: i32,
    ) -> String {
        let code = format!("T{}", &Uuid::new_v4().simple().to_string()[..9]).to_uppercase();
        sqlx::query(
            "INSERT INTO voucher (id, code, discount, min_order_amount, max_discount, quantity, \
             created_on) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::new_v4())
        .bind(&code)
        .bind(BigDecimal::from(discount))
        .bind(min_order_amount.map(BigDecimal::from))
        .bind(max_discount.map(BigDecimal::from))
        .bind(quantity)
        .bind(Utc::now())
        .execute(pool)
        .await
        .expect("Failed to insert test voucher");
        code
    }

    pub async fn create_test_address(pool: &PgPool, user_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO address (id, user_id, full_name, phone_number, province, district, ward, \
             detail, is_default, created_on) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, true, $9)",
        )
        .bind(id)
        .bind(user_id)
        .bind("Mai Tran")
        .bind("0901234567")
        .bind("Thành phố Hà Nội")
        .bind("Quận Ba Đình")
        .bind("Phường Phúc Xá")
        .bind("12 Hang Bai")
        .bind(Utc::now())
        .execute(pool)
        .await
        .expect("Failed to insert test address");
        id
    }

    pub async fn fetch_stock(pool: &PgPool, variant_id: Uuid) -> (i32, i32) {
        sqlx::query_as("SELECT stock, sold FROM product_type WHERE id = $1")
            .bind(variant_id)
            .fetch_one(pool)
            .await
            .expect("Failed to fetch stock")
    }
}

//! Idempotent database schema, applied at startup.
//!
//! Every statement is safe to re-run (`CREATE TABLE IF NOT EXISTS`,
//! `CREATE INDEX IF NOT EXISTS`, `CREATE OR REPLACE FUNCTION`); the server
//! applies them on boot and the CLI `schema` command applies the same set.
//!
//! `products.category` intentionally carries no foreign key to
//! `categories.name` - it is a denormalized string and the two can drift.
//! The session table is not here; it belongs to the tower-sessions store.

use sqlx::PgPool;

/// Orders above this total cannot be paid cash-on-delivery. Enforced by a
/// database trigger on `payments`; mirrored in checkout error messages.
pub const COD_TOTAL_LIMIT: i64 = 10_000;

const STATEMENTS: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'user',
        avatar_url TEXT,
        avatar_public_id TEXT,
        reset_token_hash TEXT,
        reset_token_expires_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS categories (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        icon_url TEXT,
        icon_public_id TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS products (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        price NUMERIC(12,2) NOT NULL,
        stock INTEGER NOT NULL DEFAULT 0,
        category TEXT NOT NULL DEFAULT '',
        rating NUMERIC(3,2) NOT NULL DEFAULT 0,
        review_count INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_products_category ON products (category)",
    r"
    CREATE TABLE IF NOT EXISTS product_images (
        id SERIAL PRIMARY KEY,
        product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
        url TEXT NOT NULL,
        public_id TEXT NOT NULL,
        position INTEGER NOT NULL DEFAULT 0
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_product_images_product ON product_images (product_id)",
    r"
    CREATE TABLE IF NOT EXISTS product_reviews (
        id SERIAL PRIMARY KEY,
        product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        user_name TEXT NOT NULL,
        rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
        comment TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (product_id, user_id)
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_product_reviews_product ON product_reviews (product_id)",
    r"
    CREATE TABLE IF NOT EXISTS orders (
        id SERIAL PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        items_subtotal NUMERIC(12,2) NOT NULL,
        tax_amount NUMERIC(12,2) NOT NULL,
        shipping_amount NUMERIC(12,2) NOT NULL,
        total_amount NUMERIC(12,2) NOT NULL,
        status TEXT NOT NULL DEFAULT 'processing',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        delivered_at TIMESTAMPTZ
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_orders_user ON orders (user_id)",
    r"
    CREATE TABLE IF NOT EXISTS order_items (
        id SERIAL PRIMARY KEY,
        order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
        product_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        image_url TEXT,
        quantity INTEGER NOT NULL,
        unit_price NUMERIC(12,2) NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items (order_id)",
    r"
    CREATE TABLE IF NOT EXISTS shipping_info (
        id SERIAL PRIMARY KEY,
        order_id INTEGER NOT NULL UNIQUE REFERENCES orders(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        address TEXT NOT NULL,
        city TEXT NOT NULL,
        state TEXT NOT NULL,
        country TEXT NOT NULL,
        pincode TEXT NOT NULL,
        phone TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS payments (
        id SERIAL PRIMARY KEY,
        order_id INTEGER NOT NULL UNIQUE REFERENCES orders(id) ON DELETE CASCADE,
        method TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        intent_id TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    ",
    // Reject cash-on-delivery for totals above the fixed limit. The API
    // surfaces the raised exception as a 400.
    r"
    CREATE OR REPLACE FUNCTION payments_cod_limit() RETURNS trigger AS $$
    DECLARE
        order_total NUMERIC(12,2);
    BEGIN
        IF NEW.method = 'cod' THEN
            SELECT total_amount INTO order_total FROM orders WHERE id = NEW.order_id;
            IF order_total > 10000 THEN
                RAISE EXCEPTION 'cash on delivery is not available for totals above 10000'
                    USING ERRCODE = 'P0001';
            END IF;
        END IF;
        RETURN NEW;
    END;
    $$ LANGUAGE plpgsql
    ",
    "DROP TRIGGER IF EXISTS payments_cod_limit_trigger ON payments",
    r"
    CREATE TRIGGER payments_cod_limit_trigger
        BEFORE INSERT ON payments
        FOR EACH ROW EXECUTE FUNCTION payments_cod_limit()
    ",
];

/// Apply the schema. Safe to call on every startup.
///
/// # Errors
///
/// Returns `sqlx::Error` if any statement fails.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!(statements = STATEMENTS.len(), "schema ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_are_idempotent_forms() {
        // Every DDL statement must be re-runnable on a populated database.
        for statement in STATEMENTS {
            let s = statement.trim_start();
            assert!(
                s.starts_with("CREATE TABLE IF NOT EXISTS")
                    || s.starts_with("CREATE INDEX IF NOT EXISTS")
                    || s.starts_with("CREATE OR REPLACE FUNCTION")
                    || s.starts_with("DROP TRIGGER IF EXISTS")
                    || s.starts_with("CREATE TRIGGER"),
                "non-idempotent statement: {s}"
            );
        }
    }

    #[test]
    fn test_cod_limit_matches_trigger_text() {
        let trigger = STATEMENTS
            .iter()
            .find(|s| s.contains("payments_cod_limit() RETURNS trigger"))
            .expect("trigger function statement present");
        assert!(trigger.contains(&COD_TOTAL_LIMIT.to_string()));
    }
}

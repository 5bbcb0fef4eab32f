//! Demo dataset: customers, orders and products.

use tracing::info;

use super::{SqliteStore, StoreError};

const SAMPLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS customers (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT UNIQUE NOT NULL,
    city TEXT,
    state TEXT,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY,
    customer_id INTEGER,
    product_name TEXT NOT NULL,
    quantity INTEGER DEFAULT 1,
    price DECIMAL(10,2),
    order_date DATETIME DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (customer_id) REFERENCES customers (id)
);

CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    category TEXT,
    price DECIMAL(10,2),
    stock_quantity INTEGER DEFAULT 0,
    description TEXT
);
"#;

const SAMPLE_DATA: &str = r#"
INSERT OR IGNORE INTO customers (id, name, email, city, state) VALUES
    (1, 'John Smith', 'john.smith@email.com', 'New York', 'NY'),
    (2, 'Jane Doe', 'jane.doe@email.com', 'Los Angeles', 'CA'),
    (3, 'Bob Johnson', 'bob.johnson@email.com', 'Chicago', 'IL'),
    (4, 'Alice Brown', 'alice.brown@email.com', 'Houston', 'TX'),
    (5, 'Charlie Wilson', 'charlie.wilson@email.com', 'Phoenix', 'AZ');

INSERT OR IGNORE INTO products (id, name, category, price, stock_quantity, description) VALUES
    (1, 'Laptop', 'Electronics', 999.99, 50, 'High-performance laptop'),
    (2, 'Smartphone', 'Electronics', 599.99, 100, 'Latest smartphone model'),
    (3, 'Coffee Mug', 'Kitchen', 12.99, 200, 'Ceramic coffee mug'),
    (4, 'Desk Chair', 'Furniture', 249.99, 25, 'Ergonomic office chair'),
    (5, 'Book', 'Education', 19.99, 75, 'Programming guide');

INSERT OR IGNORE INTO orders (id, customer_id, product_name, quantity, price, order_date) VALUES
    (1, 1, 'Laptop', 1, 999.99, '2024-01-15'),
    (2, 2, 'Smartphone', 2, 599.99, '2024-01-20'),
    (3, 3, 'Coffee Mug', 3, 12.99, '2024-02-01'),
    (4, 1, 'Desk Chair', 1, 249.99, '2024-02-15'),
    (5, 4, 'Book', 2, 19.99, '2024-03-01'),
    (6, 5, 'Smartphone', 1, 599.99, '2024-03-10'),
    (7, 2, 'Coffee Mug', 5, 12.99, '2024-03-15');
"#;

/// Create the demo tables if missing and insert their rows.
///
/// Safe to run repeatedly: existing rows are left alone.
pub fn seed_sample_data(store: &SqliteStore) -> Result<(), StoreError> {
    store.with_conn(|conn| {
        conn.execute_batch(&format!("BEGIN;{SAMPLE_SCHEMA}{SAMPLE_DATA}COMMIT;"))?;
        Ok(())
    })?;
    info!("Sample data ready (customers, orders, products)");
    Ok(())
}

/// Drop the demo tables.
pub fn reset_sample_data(store: &SqliteStore) -> Result<(), StoreError> {
    store.execute_batch(
        "DROP TABLE IF EXISTS orders; DROP TABLE IF EXISTS customers; DROP TABLE IF EXISTS products;",
    )?;
    info!("Sample tables dropped");
    Ok(())
}

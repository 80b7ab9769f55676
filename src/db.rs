// src/db.rs - Schema for development databases

use sqlx::MySqlPool;
use anyhow::{Context, Result};

const SCHEMA: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id VARCHAR(36) PRIMARY KEY,
            username VARCHAR(50) NOT NULL UNIQUE,
            email VARCHAR(255) NOT NULL UNIQUE,
            password_hash VARCHAR(255) NOT NULL,
            user_code VARCHAR(20) NOT NULL,
            company_code VARCHAR(20) NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            last_login DATETIME NULL,
            failed_login_attempts INT NOT NULL DEFAULT 0,
            locked_until DATETIME NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
            INDEX idx_users_company (company_code)
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
        "#,
    ),
    (
        "centers",
        r#"
        CREATE TABLE IF NOT EXISTS centers (
            id BIGINT AUTO_INCREMENT PRIMARY KEY,
            company_code VARCHAR(20) NOT NULL,
            code VARCHAR(30) NOT NULL,
            name VARCHAR(255) NOT NULL,
            UNIQUE KEY uq_centers_code (company_code, code)
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
        "#,
    ),
    (
        "user_centers",
        r#"
        CREATE TABLE IF NOT EXISTS user_centers (
            user_code VARCHAR(20) NOT NULL,
            center_id BIGINT NOT NULL,
            PRIMARY KEY (user_code, center_id),
            FOREIGN KEY (center_id) REFERENCES centers (id) ON DELETE CASCADE
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
        "#,
    ),
    (
        "buildings",
        r#"
        CREATE TABLE IF NOT EXISTS buildings (
            id BIGINT AUTO_INCREMENT PRIMARY KEY,
            center_id BIGINT NOT NULL,
            code VARCHAR(30) NOT NULL,
            name VARCHAR(255) NOT NULL,
            UNIQUE KEY uq_buildings_code (center_id, code),
            FOREIGN KEY (center_id) REFERENCES centers (id) ON DELETE CASCADE
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
        "#,
    ),
    (
        "movements",
        r#"
        CREATE TABLE IF NOT EXISTS movements (
            id BIGINT AUTO_INCREMENT PRIMARY KEY,
            company_code VARCHAR(20) NOT NULL,
            code VARCHAR(30) NOT NULL,
            building_id BIGINT NOT NULL,
            species VARCHAR(100) NULL,
            strain VARCHAR(100) NULL,
            placement_date DATE NULL,
            initial_headcount BIGINT NULL,
            UNIQUE KEY uq_movements_code (company_code, code),
            FOREIGN KEY (building_id) REFERENCES buildings (id)
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
        "#,
    ),
    (
        "weighings",
        r#"
        CREATE TABLE IF NOT EXISTS weighings (
            id BIGINT AUTO_INCREMENT PRIMARY KEY,
            movement_id BIGINT NOT NULL,
            weighing_date DATETIME NULL,
            week INT NULL,
            day_of_cycle INT NULL,
            headcount BIGINT NULL,
            batch_weight DOUBLE NULL,
            reference_weight DOUBLE NULL,
            INDEX idx_weighings_date (weighing_date),
            FOREIGN KEY (movement_id) REFERENCES movements (id) ON DELETE CASCADE
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
        "#,
    ),
    (
        "daily_entries",
        r#"
        CREATE TABLE IF NOT EXISTS daily_entries (
            id BIGINT AUTO_INCREMENT PRIMARY KEY,
            movement_id BIGINT NOT NULL,
            entry_date DATETIME NULL,
            week INT NULL,
            day_of_cycle INT NULL,
            headcount BIGINT NULL,
            mortality BIGINT NULL,
            feed_consumption DOUBLE NULL,
            water_consumption DOUBLE NULL,
            eggs_total BIGINT NULL,
            eggs_broken BIGINT NULL,
            INDEX idx_daily_entries_date (entry_date),
            FOREIGN KEY (movement_id) REFERENCES movements (id) ON DELETE CASCADE
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
        "#,
    ),
];

/// Creates the report schema if it is missing. Safe to run on every start.
pub async fn run_migrations(pool: &MySqlPool) -> Result<()> {
    for (table, ddl) in SCHEMA {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create table {}", table))?;
    }
    log::info!("Database schema verified ({} tables)", SCHEMA.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent() {
        for (table, ddl) in SCHEMA {
            assert!(
                ddl.contains(&format!("CREATE TABLE IF NOT EXISTS {} (", table)),
                "{}",
                table
            );
        }
    }

    #[test]
    fn test_referenced_tables_come_first() {
        let position = |name: &str| SCHEMA.iter().position(|(t, _)| *t == name).unwrap();
        assert!(position("centers") < position("user_centers"));
        assert!(position("centers") < position("buildings"));
        assert!(position("buildings") < position("movements"));
        assert!(position("movements") < position("weighings"));
        assert!(position("movements") < position("daily_entries"));
    }
}

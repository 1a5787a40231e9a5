use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::str::FromStr;
use tracing::warn;
use waypoints_common::{DatabaseSettings, Result, WaypointError};

/// Build connection options from the configured database settings
pub fn connect_options(settings: &DatabaseSettings) -> Result<PgConnectOptions> {
    match settings {
        DatabaseSettings::ConnectionString(conn) => parse_connection_string(conn),
        DatabaseSettings::Components {
            host,
            port,
            user,
            password,
            name,
        } => {
            let mut options = PgConnectOptions::new()
                .host(host)
                .port(*port)
                .database(name);
            if let Some(user) = user {
                options = options.username(user);
            }
            if let Some(password) = password {
                options = options.password(password);
            }
            Ok(options)
        }
    }
}

/// Parse a `postgres://` URL or a libpq `key=value` string
pub fn parse_connection_string(conn: &str) -> Result<PgConnectOptions> {
    let conn = conn.trim();
    if conn.starts_with("postgres://") || conn.starts_with("postgresql://") {
        return PgConnectOptions::from_str(conn)
            .map_err(|e| WaypointError::config(format!("invalid database URL: {}", e)));
    }

    let mut options = PgConnectOptions::new();
    for (key, value) in parse_keywords(conn)? {
        options = match key.as_str() {
            "host" | "hostaddr" => options.host(&value),
            "port" => options.port(value.parse().map_err(|_| {
                WaypointError::config(format!("invalid database port '{}'", value))
            })?),
            "user" => options.username(&value),
            "password" => options.password(&value),
            "dbname" => options.database(&value),
            "application_name" => options.application_name(&value),
            "sslmode" => options.ssl_mode(PgSslMode::from_str(&value).map_err(|_| {
                WaypointError::config(format!("invalid sslmode '{}'", value))
            })?),
            other => {
                warn!("Ignoring unsupported connection parameter '{}'", other);
                options
            }
        };
    }
    Ok(options)
}

/// Split `key=value` pairs, honouring single quotes and backslash escapes
fn parse_keywords(conn: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    let mut chars = conn.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c.is_whitespace() {
                break;
            }
            key.push(c);
            chars.next();
        }
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        if chars.next() != Some('=') {
            return Err(WaypointError::config(format!(
                "missing '=' after '{}' in connection string",
                key
            )));
        }
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let mut value = String::new();
        if chars.peek() == Some(&'\'') {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => value.extend(chars.next()),
                    '\'' => {
                        closed = true;
                        break;
                    }
                    _ => value.push(c),
                }
            }
            if !closed {
                return Err(WaypointError::config("unterminated quote in connection string"));
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                chars.next();
                if c == '\\' {
                    value.extend(chars.next());
                } else {
                    value.push(c);
                }
            }
        }

        pairs.push((key, value));
    }

    Ok(pairs)
}

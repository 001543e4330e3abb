//! tokio-postgres backed executor.

use std::error::Error as StdError;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_postgres::{Client, Config, NoTls};

use crate::context::Context;
use crate::error::{OrmError, OrmResult};
use crate::executor::{ExecResult, Executor};
use crate::row::Row;
use crate::value::Value;

type BoxError = Box<dyn StdError + Sync + Send>;

/// Executor over one `tokio_postgres::Client`.
///
/// The client is shared by every clone. `begin` never sends `BEGIN` on it:
/// each transaction opens its own connection from the stored config, so
/// other handles keep running outside the transaction. Dropping a
/// transaction executor without commit or rollback closes that connection
/// and the server rolls the work back.
#[derive(Clone)]
pub struct PgExecutor {
    client: Arc<Client>,
    session: Session,
}

#[derive(Clone)]
enum Session {
    /// `None` when built from a bare client, which cannot open transactions.
    Shared(Option<Config>),
    Transaction,
}

impl Session {
    fn dedicated_config(&self) -> OrmResult<&Config> {
        match self {
            Session::Shared(Some(config)) => Ok(config),
            Session::Shared(None) => Err(OrmError::config(
                "transactions need a dedicated connection; build the executor with PgExecutor::connect",
            )),
            Session::Transaction => Err(OrmError::Other(
                "nested transactions are not supported".into(),
            )),
        }
    }

    fn ensure_transaction(&self) -> OrmResult<()> {
        match self {
            Session::Transaction => Ok(()),
            Session::Shared(_) => Err(OrmError::Other("no open transaction".into())),
        }
    }
}

impl PgExecutor {
    /// Wrap an already connected client. Such an executor runs statements
    /// but refuses `begin`.
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
            session: Session::Shared(None),
        }
    }

    /// Connect without TLS and drive the connection on a background task.
    pub async fn connect(dsn: &str) -> OrmResult<Self> {
        let config: Config = dsn.parse()?;
        let client = open(&config).await?;
        Ok(Self {
            client: Arc::new(client),
            session: Session::Shared(Some(config)),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

async fn open(config: &Config) -> OrmResult<Client> {
    let (client, connection) = config.connect(NoTls).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(target: "relorm", error = %e, "postgres connection closed");
        }
    });
    Ok(client)
}

/// Rewrite `?` placeholders to `$1..$n`, leaving quoted text alone.
pub fn rebind(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0usize;
    let mut quote: Option<char> = None;
    for ch in sql.chars() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
                out.push(ch);
            }
            None if ch == '\'' || ch == '"' => {
                quote = Some(ch);
                out.push(ch);
            }
            None if ch == '?' => {
                n += 1;
                out.push('$');
                out.push_str(&n.to_string());
            }
            None => out.push(ch),
        }
    }
    out
}

async fn with_deadline<T, F>(ctx: &Context, fut: F) -> OrmResult<T>
where
    F: Future<Output = Result<T, tokio_postgres::Error>>,
{
    ctx.check()?;
    match ctx.remaining() {
        Some(left) => tokio::time::timeout(left, fut)
            .await
            .map_err(|_| OrmError::Timeout(left))?
            .map_err(OrmError::from),
        None => fut.await.map_err(OrmError::from),
    }
}

fn params(args: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    args.iter().map(|a| a as &(dyn ToSql + Sync)).collect()
}

#[async_trait]
impl Executor for PgExecutor {
    async fn exec(&self, ctx: &Context, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        let sql = rebind(sql);
        let params = params(args);
        let rows_affected = with_deadline(ctx, self.client.execute(sql.as_str(), &params)).await?;
        Ok(ExecResult {
            rows_affected,
            last_insert_id: None,
        })
    }

    async fn query(&self, ctx: &Context, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        let sql = rebind(sql);
        let params = params(args);
        let rows = with_deadline(ctx, self.client.query(sql.as_str(), &params)).await?;
        rows.iter().map(convert_row).collect()
    }

    async fn begin(&self, ctx: &Context) -> OrmResult<Arc<dyn Executor>> {
        let config = self.session.dedicated_config()?;
        ctx.check()?;
        let client = match ctx.remaining() {
            Some(left) => tokio::time::timeout(left, open(config))
                .await
                .map_err(|_| OrmError::Timeout(left))??,
            None => open(config).await?,
        };
        with_deadline(ctx, client.batch_execute("BEGIN")).await?;
        Ok(Arc::new(PgExecutor {
            client: Arc::new(client),
            session: Session::Transaction,
        }))
    }

    async fn commit(&self, ctx: &Context) -> OrmResult<()> {
        self.session.ensure_transaction()?;
        with_deadline(ctx, self.client.batch_execute("COMMIT")).await
    }

    async fn rollback(&self, ctx: &Context) -> OrmResult<()> {
        self.session.ensure_transaction()?;
        with_deadline(ctx, self.client.batch_execute("ROLLBACK")).await
    }
}

fn int_to_sql(i: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if *ty == Type::INT2 {
        i16::try_from(i)?.to_sql(ty, out)
    } else if *ty == Type::INT4 {
        i32::try_from(i)?.to_sql(ty, out)
    } else if *ty == Type::OID {
        u32::try_from(i)?.to_sql(ty, out)
    } else if *ty == Type::FLOAT8 {
        (i as f64).to_sql(ty, out)
    } else if *ty == Type::FLOAT4 {
        (i as f32).to_sql(ty, out)
    } else {
        i.to_sql(ty, out)
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => b.to_sql(ty, out),
            Value::Int(i) => int_to_sql(*i, ty, out),
            Value::UInt(u) => int_to_sql(i64::try_from(*u)?, ty, out),
            Value::Float(f) if *ty == Type::FLOAT4 => (*f as f32).to_sql(ty, out),
            Value::Float(f) => f.to_sql(ty, out),
            Value::Text(s) => s.to_sql(ty, out),
            Value::Bytes(b) => b.to_sql(ty, out),
            Value::Timestamp(t) if *ty == Type::TIMESTAMPTZ => t.and_utc().to_sql(ty, out),
            Value::Timestamp(t) => t.to_sql(ty, out),
            Value::Date(d) => d.to_sql(ty, out),
            Value::Json(j) => j.to_sql(ty, out),
            Value::List(_) => Err("list arguments must be expanded before binding".into()),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn convert_row(row: &tokio_postgres::Row) -> OrmResult<Row> {
    let mut out = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, idx, column.type_())
            .map_err(|e| OrmError::decode(column.name(), e.to_string()))?;
        out.push(column.name(), value);
    }
    Ok(out)
}

fn decode_column(
    row: &tokio_postgres::Row,
    idx: usize,
    ty: &Type,
) -> Result<Value, tokio_postgres::Error> {
    macro_rules! get {
        ($t:ty) => {
            row.try_get::<_, Option<$t>>(idx)?.map(Value::from)
        };
    }

    let value = if *ty == Type::BOOL {
        get!(bool)
    } else if *ty == Type::CHAR {
        get!(i8)
    } else if *ty == Type::INT2 {
        get!(i16)
    } else if *ty == Type::INT4 {
        get!(i32)
    } else if *ty == Type::INT8 {
        get!(i64)
    } else if *ty == Type::OID {
        get!(u32)
    } else if *ty == Type::FLOAT4 {
        get!(f32)
    } else if *ty == Type::FLOAT8 {
        get!(f64)
    } else if *ty == Type::BYTEA {
        get!(Vec<u8>)
    } else if *ty == Type::TIMESTAMP {
        get!(NaiveDateTime)
    } else if *ty == Type::TIMESTAMPTZ {
        get!(DateTime<Utc>)
    } else if *ty == Type::DATE {
        get!(NaiveDate)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        get!(serde_json::Value)
    } else {
        get!(String)
    };
    Ok(value.unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebind_numbers_placeholders() {
        assert_eq!(
            rebind("UPDATE \"users\" SET \"name\"=? WHERE (\"id\"=?);"),
            "UPDATE \"users\" SET \"name\"=$1 WHERE (\"id\"=$2);"
        );
    }

    #[test]
    fn rebind_skips_literals() {
        assert_eq!(
            rebind("SELECT '?' FROM t WHERE a = ? AND b IN (?, ?)"),
            "SELECT '?' FROM t WHERE a = $1 AND b IN ($2, $3)"
        );
    }

    #[test]
    fn bare_client_cannot_begin() {
        let err = Session::Shared(None).dedicated_config().unwrap_err();
        assert!(matches!(err, OrmError::Config(_)));
    }

    #[test]
    fn shared_session_begins_on_its_own_connection() {
        let config: Config = "host=localhost user=app dbname=shop".parse().unwrap();
        let session = Session::Shared(Some(config));
        assert_eq!(session.dedicated_config().unwrap().get_dbname(), Some("shop"));
        assert!(session.ensure_transaction().is_err());
    }

    #[test]
    fn transaction_session_rejects_nesting() {
        let session = Session::Transaction;
        assert!(session.dedicated_config().is_err());
        assert!(session.ensure_transaction().is_ok());
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use common::ledger::{LedgerError, LedgerProvider, LedgerRecord, RecordId};

use crate::database::Database;

fn to_row_id(id: RecordId) -> Result<i64, LedgerError<sqlx::Error>> {
    i64::try_from(id).map_err(|_| LedgerError::RecordNotFound(id))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

impl Database {
    /// Number of updates applied to a record since creation
    ///
    /// Diagnostic only: writers are not checked against it, so concurrent
    /// updates still race and the last one wins.
    pub async fn update_seq(&self, id: RecordId) -> Result<u64, LedgerError<sqlx::Error>> {
        let row = sqlx::query(
            r#"
            SELECT update_seq FROM records WHERE id = ?
            "#,
        )
        .bind(to_row_id(id)?)
        .fetch_optional(&**self)
        .await
        .map_err(LedgerError::Provider)?
        .ok_or(LedgerError::RecordNotFound(id))?;

        let seq: i64 = row.try_get("update_seq").map_err(LedgerError::Provider)?;
        Ok(seq.max(0) as u64)
    }
}

#[async_trait]
impl LedgerProvider for Database {
    type Error = sqlx::Error;

    async fn create_record(
        &self,
        owner: &str,
        content_address: &str,
        memo: &str,
    ) -> Result<RecordId, LedgerError<Self::Error>> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO records (owner, content_address, memo, update_seq, created_at, updated_at)
            VALUES (?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(owner.to_ascii_lowercase())
        .bind(content_address)
        .bind(memo)
        .bind(&now)
        .bind(&now)
        .execute(&**self)
        .await
        .map_err(LedgerError::Provider)?;

        let id = result.last_insert_rowid() as RecordId;
        tracing::debug!("ledger record {} created", id);
        Ok(id)
    }

    async fn update_record(
        &self,
        id: RecordId,
        content_address: &str,
        memo: &str,
    ) -> Result<(), LedgerError<Self::Error>> {
        let result = sqlx::query(
            r#"
            UPDATE records
            SET content_address = ?, memo = ?, update_seq = update_seq + 1, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(content_address)
        .bind(memo)
        .bind(Utc::now().to_rfc3339())
        .bind(to_row_id(id)?)
        .execute(&**self)
        .await
        .map_err(LedgerError::Provider)?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::RecordNotFound(id));
        }
        tracing::debug!("ledger record {} updated", id);
        Ok(())
    }

    async fn get_record(&self, id: RecordId) -> Result<LedgerRecord, LedgerError<Self::Error>> {
        let row = sqlx::query(
            r#"
            SELECT owner, content_address, memo, created_at
            FROM records
            WHERE id = ?
            "#,
        )
        .bind(to_row_id(id)?)
        .fetch_optional(&**self)
        .await
        .map_err(LedgerError::Provider)?
        .ok_or(LedgerError::RecordNotFound(id))?;

        let created_at: String = row.try_get("created_at").map_err(LedgerError::Provider)?;
        Ok(LedgerRecord {
            id,
            owner: row.try_get("owner").map_err(LedgerError::Provider)?,
            content_address: row
                .try_get("content_address")
                .map_err(LedgerError::Provider)?,
            memo: row.try_get("memo").map_err(LedgerError::Provider)?,
            created_at: parse_timestamp(&created_at).map_err(LedgerError::Provider)?,
        })
    }

    async fn list_records_owned_by(
        &self,
        owner: &str,
    ) -> Result<Vec<RecordId>, LedgerError<Self::Error>> {
        let rows = sqlx::query(
            r#"
            SELECT id FROM records WHERE owner = ? ORDER BY id
            "#,
        )
        .bind(owner.to_ascii_lowercase())
        .fetch_all(&**self)
        .await
        .map_err(LedgerError::Provider)?;

        rows.iter()
            .map(|row| {
                row.try_get::<i64, _>("id")
                    .map(|id| id as RecordId)
                    .map_err(LedgerError::Provider)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_get_update() {
        let db = Database::in_memory().await.unwrap();

        let id = db.create_record("0xABC", "addr1", "memo1").await.unwrap();
        let record = db.get_record(id).await.unwrap();
        assert_eq!(record.owner, "0xabc");
        assert_eq!(record.content_address, "addr1");
        assert_eq!(record.memo, "memo1");
        assert_eq!(db.update_seq(id).await.unwrap(), 0);

        db.update_record(id, "addr2", "memo2").await.unwrap();
        db.update_record(id, "addr3", "memo3").await.unwrap();
        let updated = db.get_record(id).await.unwrap();
        assert_eq!(updated.content_address, "addr3");
        assert_eq!(updated.memo, "memo3");
        assert_eq!(updated.created_at, record.created_at);
        assert_eq!(db.update_seq(id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_missing_record() {
        let db = Database::in_memory().await.unwrap();
        assert!(matches!(
            db.get_record(7).await,
            Err(LedgerError::RecordNotFound(7))
        ));
        assert!(matches!(
            db.update_record(7, "a", "m").await,
            Err(LedgerError::RecordNotFound(7))
        ));
        assert!(matches!(
            db.get_record(u64::MAX).await,
            Err(LedgerError::RecordNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_by_owner() {
        let db = Database::in_memory().await.unwrap();
        let a1 = db.create_record("0xa", "x", "m").await.unwrap();
        db.create_record("0xb", "x", "m").await.unwrap();
        let a2 = db.create_record("0xA", "x", "m").await.unwrap();

        assert_eq!(db.list_records_owned_by("0xa").await.unwrap(), vec![a1, a2]);
        assert!(db.list_records_owned_by("0xc").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_document_manager_over_sqlite() {
        use common::credential::LocalCredentialProvider;
        use common::crypto::OwnerSecretKey;
        use common::document::DocumentManager;
        use common::storage::BlobsStore;

        let db = Database::in_memory().await.unwrap();
        let blobs = BlobsStore::memory().await.unwrap();
        let key = OwnerSecretKey::generate().unwrap();
        let owner = key.public().address();
        let manager =
            DocumentManager::new(blobs, db.clone(), LocalCredentialProvider::new(key), owner);

        let (id, chain) = manager.create(b"# Hello\n\nWorld", None).await.unwrap();
        let chain = manager.update(&chain, b"# Hello\n\nWorld v2", None).await.unwrap();
        manager.commit(id, &chain).await.unwrap();

        let loaded = manager.load(id).await.unwrap();
        assert_eq!(loaded.current_version(), 2);
        assert_eq!(manager.list(false).await.unwrap().len(), 1);
        assert_eq!(db.update_seq(id).await.unwrap(), 1);
    }
}

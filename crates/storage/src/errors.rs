use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error")]
    Database(#[from] redb::Error),

    #[error("Transaction error")]
    TransactionError(#[from] redb::TransactionError),

    #[error("Commit error")]
    CommitError(#[from] redb::CommitError),

    #[error("Storage error")]
    StorageError(#[from] redb::StorageError),

    #[error("Table error")]
    TableError(#[from] redb::TableError),

    #[error("Durability error")]
    SetDurability(#[from] redb::SetDurabilityError),

    #[error("Ban entry encoding error")]
    Encoding(#[from] bincode::Error),
}

//! Record store (REST rows)
//!
//! Thin typed wrapper over the `/rest/v1/{table}` endpoints. Filters use
//! the `column=eq.value` syntax of the backend.

use crate::client::BackendClient;
use crate::error::{Error, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Sort direction for [`Table::list_ordered`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    fn as_str(self) -> &'static str {
        match self {
            Order::Ascending => "asc",
            Order::Descending => "desc",
        }
    }
}

/// Handle on one table of the record store
#[derive(Debug, Clone)]
pub struct Table {
    client: BackendClient,
    name: String,
}

impl Table {
    pub(crate) fn new(client: BackendClient, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> String {
        format!("/rest/v1/{}", self.name)
    }

    /// Lists every row ordered by `column`
    pub async fn list_ordered<T: DeserializeOwned>(&self, column: &str, order: Order) -> Result<Vec<T>> {
        let order = format!("{}.{}", column, order.as_str());
        let request = self
            .client
            .request(Method::GET, &self.path())
            .query(&[("select", "*"), ("order", order.as_str())]);

        let rows: Vec<T> = self.client.send_json(request).await?;
        debug!("{}: fetched {} rows", self.name, rows.len());
        Ok(rows)
    }

    /// Selects the rows where `column` equals `value`
    pub async fn select_eq<T: DeserializeOwned>(&self, column: &str, value: &str) -> Result<Vec<T>> {
        let filter = format!("eq.{}", value);
        let request = self
            .client
            .request(Method::GET, &self.path())
            .query(&[("select", "*"), (column, filter.as_str())]);

        self.client.send_json(request).await
    }

    /// Inserts one row and returns it as stored by the backend
    pub async fn insert<B, T>(&self, row: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .client
            .request(Method::POST, &self.path())
            .header("Prefer", "return=representation")
            .json(row);

        let mut rows: Vec<T> = self.client.send_json(request).await?;
        if rows.is_empty() {
            return Err(Error::other(format!(
                "insert into {} returned no row",
                self.name
            )));
        }
        Ok(rows.swap_remove(0))
    }

    /// Updates the rows where `column` equals `value`
    pub async fn update_eq<B: Serialize + ?Sized>(&self, column: &str, value: &str, patch: &B) -> Result<()> {
        let filter = format!("eq.{}", value);
        let request = self
            .client
            .request(Method::PATCH, &self.path())
            .query(&[(column, filter.as_str())])
            .json(patch);

        self.client.send_empty(request).await
    }

    /// Deletes the rows where `column` equals `value`
    pub async fn delete_eq(&self, column: &str, value: &str) -> Result<()> {
        let filter = format!("eq.{}", value);
        let request = self
            .client
            .request(Method::DELETE, &self.path())
            .query(&[(column, filter.as_str())]);

        self.client.send_empty(request).await
    }
}

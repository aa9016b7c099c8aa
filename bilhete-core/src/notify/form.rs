//! Order-log sink: posts each transaction as a row to an external
//! spreadsheet-backed form.

use reqwest::Client;
use tracing::debug;

use crate::{config::OrderLogConfig, error::Result, model::Transaction};

// Field ids of the receiving form. External contract, do not rename.
const ENTRY_BUYER_NAME: &str = "entry.1552785722";
const ENTRY_BUYER_PHONE: &str = "entry.1303791748";
const ENTRY_BUYER_EMAIL: &str = "entry.1499492708";
const ENTRY_CHILD_COUNT: &str = "entry.1123772826";
const ENTRY_CHILD_AGES: &str = "entry.1626724011";
const ENTRY_TICKET_COUNT: &str = "entry.39898872";
const ENTRY_TRANSACTION_ID: &str = "entry.827343819";
const ENTRY_TIMESTAMP: &str = "entry.691609952";

/// Posts the transaction fields to the form endpoint.
pub(super) async fn send(
    http: &Client,
    config: &OrderLogConfig,
    transaction: &Transaction,
) -> Result<()> {
    let ages = transaction
        .children
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let timestamp = transaction.updated_at.format("%d/%m/%Y, %H:%M:%S").to_string();
    let child_count = transaction.children.len().to_string();
    let ticket_count = transaction.ticket_count.to_string();

    let fields = [
        (ENTRY_BUYER_NAME, transaction.buyer.name.as_str()),
        (ENTRY_BUYER_PHONE, transaction.buyer.phone.as_str()),
        (ENTRY_BUYER_EMAIL, transaction.buyer.email.as_str()),
        (ENTRY_CHILD_COUNT, child_count.as_str()),
        (ENTRY_CHILD_AGES, ages.as_str()),
        (ENTRY_TICKET_COUNT, ticket_count.as_str()),
        (ENTRY_TRANSACTION_ID, transaction.id.as_str()),
        (ENTRY_TIMESTAMP, timestamp.as_str()),
    ];

    let url = format!("{}/{}/formResponse", config.base_url, config.form_id);
    http.post(url).form(&fields).send().await?;

    debug!(transaction_id = %transaction.id, "order row logged");
    Ok(())
}

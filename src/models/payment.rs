use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use super::booking::PaymentStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, Display, EnumString)]
pub enum PaymentMethod {
    #[default]
    Cash,
    GPay,
    Online,
}

text_column!(PaymentMethod);

#[derive(Debug, Clone, sqlx::FromRow, Serialize, JsonSchema)]
pub struct Payment {
    pub id: i32,
    pub booking_id: i32,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub collected_by: String,
    pub payment_date: NaiveDateTime,
    pub payment_received_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PaymentRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub payment_received_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReceiptDateCorrection {
    pub payment_received_date: NaiveDate,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PaymentRecordedResponse {
    pub payment_id: i32,
    pub total_paid: Decimal,
    pub final_amount: Decimal,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PaymentListResponse {
    pub payments: Vec<Payment>,
    pub total_paid: Decimal,
}

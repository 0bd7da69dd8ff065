//! Wire types shared by the churn server and its clients.

pub mod record;
pub mod response;

pub use record::{
    Column, ColumnValue, Contract, CustomerRecord, Gender, InternetAddon, InternetService,
    MultipleLines, PaymentMethod, YesNo,
};
pub use response::{format_percentage, PredictionResponse, MODEL_OUTPUT_OK};

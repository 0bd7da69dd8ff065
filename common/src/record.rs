use serde::{Deserialize, Serialize};

/// Declares a categorical attribute whose serialized labels are the exact
/// strings used on the wire and in the model's one-hot feature names.
macro_rules! categorical {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            pub const LABELS: &'static [&'static str] = &[$($label),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

categorical!(Gender {
    Female => "Female",
    Male => "Male",
});

categorical!(
    /// Plain yes/no flag (partner, dependents, phone service, paperless billing).
    YesNo {
        Yes => "Yes",
        No => "No",
    }
);

categorical!(MultipleLines {
    Yes => "Yes",
    No => "No",
    NoPhoneService => "No phone service",
});

categorical!(InternetService {
    Dsl => "DSL",
    FiberOptic => "Fiber optic",
    No => "No",
});

categorical!(
    /// Add-on that only exists when the customer has internet service.
    InternetAddon {
        Yes => "Yes",
        No => "No",
        NoInternetService => "No internet service",
    }
);

categorical!(Contract {
    MonthToMonth => "Month-to-month",
    OneYear => "One year",
    TwoYear => "Two year",
});

categorical!(PaymentMethod {
    ElectronicCheck => "Electronic check",
    MailedCheck => "Mailed check",
    BankTransfer => "Bank transfer (automatic)",
    CreditCard => "Credit card (automatic)",
});

/// Column of the customer schema, named as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Gender,
    SeniorCitizen,
    Partner,
    Dependents,
    Tenure,
    PhoneService,
    MultipleLines,
    InternetService,
    OnlineSecurity,
    OnlineBackup,
    DeviceProtection,
    TechSupport,
    StreamingTv,
    StreamingMovies,
    Contract,
    PaperlessBilling,
    PaymentMethod,
    MonthlyCharges,
    TotalCharges,
}

impl Column {
    pub const ALL: [Column; 19] = [
        Column::Gender,
        Column::SeniorCitizen,
        Column::Partner,
        Column::Dependents,
        Column::Tenure,
        Column::PhoneService,
        Column::MultipleLines,
        Column::InternetService,
        Column::OnlineSecurity,
        Column::OnlineBackup,
        Column::DeviceProtection,
        Column::TechSupport,
        Column::StreamingTv,
        Column::StreamingMovies,
        Column::Contract,
        Column::PaperlessBilling,
        Column::PaymentMethod,
        Column::MonthlyCharges,
        Column::TotalCharges,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Gender => "Gender",
            Column::SeniorCitizen => "SeniorCitizen",
            Column::Partner => "Partner",
            Column::Dependents => "Dependents",
            Column::Tenure => "tenure",
            Column::PhoneService => "PhoneService",
            Column::MultipleLines => "MultipleLines",
            Column::InternetService => "InternetService",
            Column::OnlineSecurity => "OnlineSecurity",
            Column::OnlineBackup => "OnlineBackup",
            Column::DeviceProtection => "DeviceProtection",
            Column::TechSupport => "TechSupport",
            Column::StreamingTv => "StreamingTV",
            Column::StreamingMovies => "StreamingMovies",
            Column::Contract => "Contract",
            Column::PaperlessBilling => "PaperlessBilling",
            Column::PaymentMethod => "PaymentMethod",
            Column::MonthlyCharges => "MonthlyCharges",
            Column::TotalCharges => "TotalCharges",
        }
    }

    pub fn from_name(name: &str) -> Option<Column> {
        Column::ALL.into_iter().find(|column| column.name() == name)
    }

    /// Allowed labels for categorical columns, `None` for numeric ones.
    pub fn domain(self) -> Option<&'static [&'static str]> {
        match self {
            Column::Gender => Some(Gender::LABELS),
            Column::Partner
            | Column::Dependents
            | Column::PhoneService
            | Column::PaperlessBilling => Some(YesNo::LABELS),
            Column::MultipleLines => Some(MultipleLines::LABELS),
            Column::InternetService => Some(InternetService::LABELS),
            Column::OnlineSecurity
            | Column::OnlineBackup
            | Column::DeviceProtection
            | Column::TechSupport
            | Column::StreamingTv
            | Column::StreamingMovies => Some(InternetAddon::LABELS),
            Column::Contract => Some(Contract::LABELS),
            Column::PaymentMethod => Some(PaymentMethod::LABELS),
            Column::SeniorCitizen
            | Column::Tenure
            | Column::MonthlyCharges
            | Column::TotalCharges => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnValue {
    Number(f64),
    Category(&'static str),
}

/// One customer as submitted for scoring.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CustomerRecord {
    #[serde(rename = "Gender")]
    pub gender: Gender,
    #[serde(rename = "SeniorCitizen")]
    pub senior_citizen: u8,
    #[serde(rename = "Partner")]
    pub partner: YesNo,
    #[serde(rename = "Dependents")]
    pub dependents: YesNo,
    pub tenure: u32,
    #[serde(rename = "PhoneService")]
    pub phone_service: YesNo,
    #[serde(rename = "MultipleLines")]
    pub multiple_lines: MultipleLines,
    #[serde(rename = "InternetService")]
    pub internet_service: InternetService,
    #[serde(rename = "OnlineSecurity")]
    pub online_security: InternetAddon,
    #[serde(rename = "OnlineBackup")]
    pub online_backup: InternetAddon,
    #[serde(rename = "DeviceProtection")]
    pub device_protection: InternetAddon,
    #[serde(rename = "TechSupport")]
    pub tech_support: InternetAddon,
    #[serde(rename = "StreamingTV")]
    pub streaming_tv: InternetAddon,
    #[serde(rename = "StreamingMovies")]
    pub streaming_movies: InternetAddon,
    #[serde(rename = "Contract")]
    pub contract: Contract,
    #[serde(rename = "PaperlessBilling")]
    pub paperless_billing: YesNo,
    #[serde(rename = "PaymentMethod")]
    pub payment_method: PaymentMethod,
    #[serde(rename = "MonthlyCharges")]
    pub monthly_charges: f64,
    #[serde(rename = "TotalCharges")]
    pub total_charges: f64,
}

impl CustomerRecord {
    /// Checks the constraints serde cannot express. Categorical domains are
    /// already enforced during deserialization.
    pub fn validate(&self) -> Result<(), String> {
        if self.senior_citizen > 1 {
            return Err(format!(
                "SeniorCitizen must be 0 or 1 (value: {})",
                self.senior_citizen
            ));
        }

        let charges = [
            ("MonthlyCharges", self.monthly_charges),
            ("TotalCharges", self.total_charges),
        ];
        for (name, value) in charges {
            if !value.is_finite() || value < 0.0 {
                return Err(format!(
                    "{} must be a non-negative number (value: {})",
                    name, value
                ));
            }
        }

        Ok(())
    }

    pub fn value(&self, column: Column) -> ColumnValue {
        use ColumnValue::{Category, Number};

        match column {
            Column::Gender => Category(self.gender.as_str()),
            Column::SeniorCitizen => Number(f64::from(self.senior_citizen)),
            Column::Partner => Category(self.partner.as_str()),
            Column::Dependents => Category(self.dependents.as_str()),
            Column::Tenure => Number(f64::from(self.tenure)),
            Column::PhoneService => Category(self.phone_service.as_str()),
            Column::MultipleLines => Category(self.multiple_lines.as_str()),
            Column::InternetService => Category(self.internet_service.as_str()),
            Column::OnlineSecurity => Category(self.online_security.as_str()),
            Column::OnlineBackup => Category(self.online_backup.as_str()),
            Column::DeviceProtection => Category(self.device_protection.as_str()),
            Column::TechSupport => Category(self.tech_support.as_str()),
            Column::StreamingTv => Category(self.streaming_tv.as_str()),
            Column::StreamingMovies => Category(self.streaming_movies.as_str()),
            Column::Contract => Category(self.contract.as_str()),
            Column::PaperlessBilling => Category(self.paperless_billing.as_str()),
            Column::PaymentMethod => Category(self.payment_method.as_str()),
            Column::MonthlyCharges => Number(self.monthly_charges),
            Column::TotalCharges => Number(self.total_charges),
        }
    }

    /// Demo customer used by the interactive client as its starting point.
    pub fn demo() -> Self {
        CustomerRecord {
            gender: Gender::Male,
            senior_citizen: 0,
            partner: YesNo::No,
            dependents: YesNo::No,
            tenure: 1,
            phone_service: YesNo::Yes,
            multiple_lines: MultipleLines::No,
            internet_service: InternetService::FiberOptic,
            online_security: InternetAddon::No,
            online_backup: InternetAddon::No,
            device_protection: InternetAddon::No,
            tech_support: InternetAddon::No,
            streaming_tv: InternetAddon::No,
            streaming_movies: InternetAddon::No,
            contract: Contract::MonthToMonth,
            paperless_billing: YesNo::Yes,
            payment_method: PaymentMethod::ElectronicCheck,
            monthly_charges: 70.35,
            total_charges: 70.35,
        }
    }
}

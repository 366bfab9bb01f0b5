use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::error::EngineError;

macro_rules! vendor_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Result<Self, EngineError> {
                let id = id.into();
                if !id.starts_with($prefix) || id.len() <= $prefix.len() {
                    return Err(EngineError::Validation(format!(
                        concat!(stringify!($name), " must start with ", $prefix, ", got: {}"),
                        id
                    )));
                }
                Ok(Self(id))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }
    };
}

vendor_id!(
    /// Gateway payment identifier (`tr_xxx`).
    PaymentId,
    "tr_"
);

vendor_id!(
    /// Gateway customer identifier (`cst_xxx`).
    CustomerId,
    "cst_"
);

vendor_id!(
    /// Gateway mandate identifier (`mdt_xxx`).
    MandateId,
    "mdt_"
);

vendor_id!(
    /// Gateway recurring-schedule identifier (`sub_xxx`).
    VendorSubscriptionId,
    "sub_"
);

vendor_id!(
    /// Gateway refund identifier (`re_xxx`).
    RefundId,
    "re_"
);

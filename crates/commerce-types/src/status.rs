//! Closed status sets and their transition rules.
//!
//! Decoding is total: any unrecognized string becomes `Unspecified` instead
//! of failing, so validity is checked where statuses are written, never
//! where they are read. `Unspecified` is never a legal transition target.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            #[default]
            Unspecified,
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    Self::Unspecified => "UNSPECIFIED",
                    $(Self::$variant => $text),+
                }
            }

            /// Decode a status string; unknown values yield `Unspecified`.
            pub fn parse(s: &str) -> Self {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($text => Self::$variant,)+
                    _ => Self::Unspecified,
                }
            }

            pub fn is_specified(&self) -> bool {
                !matches!(self, Self::Unspecified)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::parse(&s)
            }
        }

        impl From<$name> for String {
            fn from(status: $name) -> String {
                status.as_str().to_string()
            }
        }
    };
}

status_enum!(
    /// Lifecycle of a price quote.
    QuoteStatus {
        Pending => "PENDING",
        Accepted => "ACCEPTED",
        Rejected => "REJECTED",
        Expired => "EXPIRED",
    }
);

status_enum!(
    /// Lifecycle of an order.
    OrderStatus {
        Pending => "PENDING",
        Paid => "PAID",
        Shipped => "SHIPPED",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
        Refunded => "REFUNDED",
    }
);

status_enum!(
    /// Lifecycle of a payment.
    PaymentStatus {
        Pending => "PENDING",
        Succeeded => "SUCCEEDED",
        Refunded => "REFUNDED",
    }
);

status_enum!(
    /// Settlement state of a ledger transaction.
    TransactionStatus {
        Pending => "PENDING",
        Completed => "COMPLETED",
        Failed => "FAILED",
    }
);

status_enum!(
    /// Direction of a ledger transaction.
    TransactionType {
        Debit => "DEBIT",
        Credit => "CREDIT",
    }
);

status_enum!(
    /// Shared lifecycle for investment, banking, marketplace, and exchange records.
    LifecycleStatus {
        Pending => "PENDING",
        Active => "ACTIVE",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
        Failed => "FAILED",
    }
);

impl QuoteStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected | Self::Expired)
    }

    /// `PENDING` moves to any terminal state; terminal states are final.
    pub fn can_transition_to(&self, next: QuoteStatus) -> bool {
        matches!(self, Self::Pending) && next.is_terminal()
    }
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Refunded)
    }

    /// `PENDING -> PAID -> SHIPPED -> COMPLETED`, with `CANCELLED` and
    /// `REFUNDED` reachable from every non-terminal state.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if !self.is_specified() || self.is_terminal() {
            return false;
        }
        match next {
            Self::Cancelled | Self::Refunded => true,
            Self::Paid => matches!(self, Self::Pending),
            Self::Shipped => matches!(self, Self::Paid),
            Self::Completed => matches!(self, Self::Shipped),
            Self::Pending | Self::Unspecified => false,
        }
    }
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Refunded)
    }

    /// `PENDING -> SUCCEEDED -> REFUNDED`. A payment that never succeeded
    /// cannot be refunded.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Succeeded) | (Self::Succeeded, Self::Refunded)
        )
    }
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        matches!(self, Self::Pending) && next.is_terminal()
    }
}

impl LifecycleStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    pub fn can_transition_to(&self, next: LifecycleStatus) -> bool {
        match self {
            Self::Pending => matches!(next, Self::Active) || next.is_terminal(),
            Self::Active => next.is_terminal(),
            _ => false,
        }
    }
}

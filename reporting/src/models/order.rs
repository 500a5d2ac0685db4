//! Order event and algorithm status models.
//!
//! These carry no state inside the handler; they are rendered to a single
//! line and forwarded to the trace sink.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created but not yet sent.
    New,
    /// Sent to the brokerage.
    Submitted,
    /// Some quantity filled.
    PartiallyFilled,
    /// Completely filled.
    Filled,
    /// Canceled before completion.
    Canceled,
    /// Rejected as invalid.
    Invalid,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "New"),
            Self::Submitted => write!(f, "Submitted"),
            Self::PartiallyFilled => write!(f, "PartiallyFilled"),
            Self::Filled => write!(f, "Filled"),
            Self::Canceled => write!(f, "Canceled"),
            Self::Invalid => write!(f, "Invalid"),
        }
    }
}

/// A change in the state of an order.
///
/// # Example
///
/// ```
/// use reporting::models::{OrderEvent, OrderStatus};
/// use rust_decimal::Decimal;
/// use chrono::Utc;
///
/// let event = OrderEvent::new(7, "SPY", OrderStatus::Filled, Utc::now())
///     .with_fill(Decimal::new(41025, 2), Decimal::from(10));
///
/// assert!(event.to_string().contains("Status: Filled"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEvent {
    /// Order identifier.
    pub order_id: u64,
    /// Traded symbol.
    pub symbol: String,
    /// New status of the order.
    pub status: OrderStatus,
    /// When the event happened (algorithm time).
    pub time: DateTime<Utc>,
    /// Fill price for this event.
    #[serde(default)]
    pub fill_price: Decimal,
    /// Filled quantity for this event (signed).
    #[serde(default)]
    pub fill_quantity: Decimal,
    /// Optional brokerage message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OrderEvent {
    /// Creates an order event without fill information.
    #[must_use]
    pub fn new(
        order_id: u64,
        symbol: impl Into<String>,
        status: OrderStatus,
        time: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            symbol: symbol.into(),
            status,
            time,
            fill_price: Decimal::ZERO,
            fill_quantity: Decimal::ZERO,
            message: None,
        }
    }

    /// Sets fill price and quantity.
    #[must_use]
    pub fn with_fill(mut self, price: Decimal, quantity: Decimal) -> Self {
        self.fill_price = price;
        self.fill_quantity = quantity;
        self
    }

    /// Sets the brokerage message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl std::fmt::Display for OrderEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Time: {} OrderID: {} Symbol: {} Status: {}",
            self.time.format("%Y-%m-%d %H:%M:%S"),
            self.order_id,
            self.symbol,
            self.status
        )?;
        if !self.fill_quantity.is_zero() {
            write!(
                f,
                " Quantity: {} FillPrice: {}",
                self.fill_quantity, self.fill_price
            )?;
        }
        if let Some(message) = &self.message {
            write!(f, " Message: {message}")?;
        }
        Ok(())
    }
}

/// Overall status of the running algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmStatus {
    /// Loading data and running initialization.
    Initializing,
    /// Processing data.
    Running,
    /// Stopped by the user.
    Stopped,
    /// Positions liquidated by the user.
    Liquidated,
    /// Finished the run.
    Completed,
    /// Stopped by an unhandled error.
    RuntimeError,
    /// Deleted by the user.
    Deleted,
}

impl std::fmt::Display for AlgorithmStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Initializing => "Initializing",
            Self::Running => "Running",
            Self::Stopped => "Stopped",
            Self::Liquidated => "Liquidated",
            Self::Completed => "Completed",
            Self::RuntimeError => "RuntimeError",
            Self::Deleted => "Deleted",
        };
        f.write_str(name)
    }
}

/// Asset class of a subscribed security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityType {
    /// Custom data.
    Base,
    /// Stocks and ETFs.
    Equity,
    /// Equity options.
    Option,
    /// Currency pairs.
    Forex,
    /// Futures contracts.
    Future,
    /// Contracts for difference.
    Cfd,
    /// Crypto currencies.
    Crypto,
}

impl std::fmt::Display for SecurityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Base => "Base",
            Self::Equity => "Equity",
            Self::Option => "Option",
            Self::Forex => "Forex",
            Self::Future => "Future",
            Self::Cfd => "Cfd",
            Self::Crypto => "Crypto",
        };
        f.write_str(name)
    }
}

mod order;

pub use order::{
    AdjustmentKind, Order, OrderAdjustmentEvent, OrderItem, PaymentStatus, VoucherKind,
};

// Domain layer: 票券模型與外部能力介面 (ports)

pub mod model;
pub mod ports;

//! 拓扑构建
//!
//! 常用的无线拓扑：点对点链路、圆盘内随机分布的多发送者。

pub mod disc;
pub mod link_pair;

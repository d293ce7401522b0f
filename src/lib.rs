//! Smart Attendance - 人脸识别考勤服务后端
//!
//! 基于 Actix Web 构建：维护班级与学生名册，保存学生参考照片，
//! 并通过班级合照比对人脸完成点名。
//!
//! # 架构
//! - `cache`: 参考照片编码缓存（Moka）
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `models`: 数据模型定义
//! - `recognition`: 人脸检测与编码（ONNX Runtime）
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: 业务逻辑层
//! - `storage`: 数据存储层（SeaORM）与照片目录
//! - `utils`: 工具函数

pub mod cache;
pub mod config;
pub mod entity;
pub mod errors;
pub mod models;
pub mod recognition;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub mod test_support;

//! HR 资源模型
//!
//! 只声明客户端关心的字段，其余字段原样保留在 `extra` 中，
//! 服务端新增字段不会导致反序列化失败。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 员工
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    #[serde(deserialize_with = "super::deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub employee_code: Option<String>,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "super::deserialize_optional_id")]
    pub department_id: Option<String>,
    #[serde(default, deserialize_with = "super::deserialize_optional_id")]
    pub designation_id: Option<String>,
    #[serde(default, deserialize_with = "super::deserialize_optional_id")]
    pub shift_id: Option<String>,
    #[serde(default)]
    pub date_of_joining: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 部门
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    #[serde(deserialize_with = "super::deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 职位
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Designation {
    #[serde(deserialize_with = "super::deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "super::deserialize_optional_id")]
    pub department_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 班次，时间为服务端原样的 "HH:MM" 字符串
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    #[serde(deserialize_with = "super::deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 考勤策略
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendancePolicy {
    #[serde(deserialize_with = "super::deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub grace_minutes: Option<u32>,
    #[serde(default)]
    pub half_day_hours: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 请假申请
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    #[serde(deserialize_with = "super::deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "super::deserialize_optional_id")]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub leave_type: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 节假日
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holiday {
    #[serde(deserialize_with = "super::deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 薪资周期
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollCycle {
    #[serde(deserialize_with = "super::deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 工资单，金额保持服务端的 JSON 数值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payroll {
    #[serde(deserialize_with = "super::deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "super::deserialize_optional_id")]
    pub employee_id: Option<String>,
    #[serde(default, deserialize_with = "super::deserialize_optional_id")]
    pub payroll_cycle_id: Option<String>,
    #[serde(default)]
    pub gross_pay: Option<Value>,
    #[serde(default)]
    pub net_pay: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

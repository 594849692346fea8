//! HR 资源的通用增删改查

use crate::client::ApiClient;
use crate::error::{ClientError, Result};
use crate::models::ListQuery;
use crate::request::{ApiRequest, RequestOptions};
use crate::response::Envelope;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use tokio_util::sync::CancellationToken;

/// HR 资源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Employees,
    Departments,
    Designations,
    Shifts,
    AttendancePolicies,
    LeaveRequests,
    Holidays,
    PayrollCycles,
    Payrolls,
}

impl Resource {
    pub const ALL: [Resource; 9] = [
        Resource::Employees,
        Resource::Departments,
        Resource::Designations,
        Resource::Shifts,
        Resource::AttendancePolicies,
        Resource::LeaveRequests,
        Resource::Holidays,
        Resource::PayrollCycles,
        Resource::Payrolls,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Resource::Employees => "employees",
            Resource::Departments => "departments",
            Resource::Designations => "designations",
            Resource::Shifts => "shifts",
            Resource::AttendancePolicies => "attendance-policies",
            Resource::LeaveRequests => "leave-requests",
            Resource::Holidays => "holidays",
            Resource::PayrollCycles => "payroll-cycles",
            Resource::Payrolls => "payrolls",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Resource {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Resource::ALL
            .into_iter()
            .find(|r| r.path() == normalized)
            .ok_or_else(|| ClientError::Validation(format!("Unknown resource: {}", s)))
    }
}

/// 单个资源的服务
pub struct ResourceService<'a, T> {
    client: &'a ApiClient,
    resource: Resource,
    _marker: PhantomData<T>,
}

impl<'a, T: DeserializeOwned> ResourceService<'a, T> {
    pub fn new(client: &'a ApiClient, resource: Resource) -> Self {
        Self {
            client,
            resource,
            _marker: PhantomData,
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    fn collection(&self) -> String {
        format!("/{}", self.resource.path())
    }

    fn member(&self, id: &str) -> Result<String> {
        let id = id.trim();
        if id.is_empty() || id.contains('/') {
            return Err(ClientError::Validation(format!("Invalid {} id: '{}'", self.resource, id)));
        }
        Ok(format!("/{}/{}", self.resource.path(), id))
    }

    fn list_request(&self, query: &ListQuery) -> ApiRequest {
        ApiRequest::get(self.collection()).params(query.to_params())
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Envelope<Vec<T>>> {
        self.client
            .send(self.list_request(query), &RequestOptions::default())
            .await
    }

    /// 可被后续请求取代的列表查询
    pub async fn list_cancellable(
        &self,
        query: &ListQuery,
        cancel: &CancellationToken,
    ) -> Result<Envelope<Vec<T>>> {
        self.client
            .send_cancellable(self.list_request(query), &RequestOptions::default(), cancel)
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Envelope<T>> {
        self.client
            .send(ApiRequest::get(self.member(id)?), &RequestOptions::default())
            .await
    }

    pub async fn create<P: Serialize>(&self, payload: &P) -> Result<Envelope<T>> {
        let url = format!("{}/create", self.collection());
        self.client
            .send(
                ApiRequest::post(url).json(serde_json::to_value(payload)?),
                &RequestOptions::default(),
            )
            .await
    }

    pub async fn update<P: Serialize>(&self, id: &str, payload: &P) -> Result<Envelope<T>> {
        self.client
            .send(
                ApiRequest::put(self.member(id)?).json(serde_json::to_value(payload)?),
                &RequestOptions::default(),
            )
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<Envelope<Option<Value>>> {
        self.client
            .send(ApiRequest::delete(self.member(id)?), &RequestOptions::default())
            .await
    }
}

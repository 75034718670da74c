//! Long-running operation messages (`cirrus.operation`).

/// An asynchronous operation returned by every mutating call.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Operation {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub description: String,
    #[prost(message, optional, tag = "3")]
    pub created_at: Option<::prost_types::Timestamp>,
    #[prost(string, tag = "4")]
    pub created_by: String,
    #[prost(message, optional, tag = "5")]
    pub modified_at: Option<::prost_types::Timestamp>,
    /// Terminal flag. When set, exactly one of `error` or the (elided)
    /// response payload is populated.
    #[prost(bool, tag = "6")]
    pub done: bool,
    #[prost(message, optional, tag = "7")]
    pub error: Option<Status>,
    /// ID of the resource this operation acts on. For create operations
    /// this carries the server-assigned ID of the new resource.
    #[prost(string, tag = "8")]
    pub resource_id: String,
}

/// `google.rpc.Status`-shaped failure payload of a finished operation.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Status {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetOperationRequest {
    #[prost(string, tag = "1")]
    pub operation_id: String,
}

impl Operation {
    /// A finished successful operation, handy in tests and fakes.
    pub fn done(id: impl Into<String>) -> Self {
        Operation {
            id: id.into(),
            done: true,
            ..Default::default()
        }
    }

    /// A finished successful operation that created or mutated `resource_id`.
    pub fn done_for(id: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Operation {
            id: id.into(),
            done: true,
            resource_id: resource_id.into(),
            ..Default::default()
        }
    }

    /// A finished failed operation.
    pub fn failed(id: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Operation {
            id: id.into(),
            done: true,
            error: Some(Status {
                code,
                message: message.into(),
            }),
            ..Default::default()
        }
    }

    /// An operation that is still running.
    pub fn running(id: impl Into<String>) -> Self {
        Operation {
            id: id.into(),
            done: false,
            ..Default::default()
        }
    }
}

//! Wire protocol for the fleet and driver services
//!
//! Hand-maintained prost/tonic bindings for `proto/fedlink.proto`. The
//! message set is intentionally small: the coordination plane only inspects
//! node ids, public keys, and task consumer references; task payloads are
//! opaque bytes.

/// A remote worker node as known to the registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct Node {
    /// Registry-assigned id, never reused while the node is alive.
    #[prost(sint64, tag = "1")]
    pub node_id: i64,
    /// True for nodes that are not individually addressable.
    #[prost(bool, tag = "2")]
    pub anonymous: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Task {
    #[prost(message, optional, tag = "1")]
    pub producer: ::core::option::Option<Node>,
    #[prost(message, optional, tag = "2")]
    pub consumer: ::core::option::Option<Node>,
    #[prost(string, tag = "3")]
    pub task_type: ::prost::alloc::string::String,
    /// Opaque payload; content is strategy-level and not inspected here.
    #[prost(bytes = "vec", tag = "4")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TaskIns {
    #[prost(string, tag = "1")]
    pub task_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub group_id: ::prost::alloc::string::String,
    #[prost(sint64, tag = "3")]
    pub run_id: i64,
    #[prost(message, optional, tag = "4")]
    pub task: ::core::option::Option<Task>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TaskRes {
    #[prost(string, tag = "1")]
    pub task_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub group_id: ::prost::alloc::string::String,
    #[prost(sint64, tag = "3")]
    pub run_id: i64,
    #[prost(message, optional, tag = "4")]
    pub task: ::core::option::Option<Task>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct CreateNodeRequest {
    /// Liveness lease duration in seconds requested by the worker.
    #[prost(double, tag = "1")]
    pub ping_interval: f64,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct CreateNodeResponse {
    #[prost(message, optional, tag = "1")]
    pub node: ::core::option::Option<Node>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct DeleteNodeRequest {
    #[prost(message, optional, tag = "1")]
    pub node: ::core::option::Option<Node>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct DeleteNodeResponse {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PullTaskInsRequest {
    #[prost(message, optional, tag = "1")]
    pub node: ::core::option::Option<Node>,
    #[prost(string, repeated, tag = "2")]
    pub task_ids: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PullTaskInsResponse {
    #[prost(message, repeated, tag = "1")]
    pub task_ins_list: ::prost::alloc::vec::Vec<TaskIns>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PushTaskResRequest {
    #[prost(message, repeated, tag = "1")]
    pub task_res_list: ::prost::alloc::vec::Vec<TaskRes>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct PushTaskResResponse {}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct CreateRunRequest {}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct CreateRunResponse {
    #[prost(sint64, tag = "1")]
    pub run_id: i64,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct GetNodesRequest {
    #[prost(sint64, tag = "1")]
    pub run_id: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetNodesResponse {
    #[prost(message, repeated, tag = "1")]
    pub nodes: ::prost::alloc::vec::Vec<Node>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PushTaskInsRequest {
    #[prost(message, repeated, tag = "1")]
    pub task_ins_list: ::prost::alloc::vec::Vec<TaskIns>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PushTaskInsResponse {
    #[prost(string, repeated, tag = "1")]
    pub task_ids: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PullTaskResRequest {
    #[prost(message, optional, tag = "1")]
    pub node: ::core::option::Option<Node>,
    #[prost(string, repeated, tag = "2")]
    pub task_ids: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PullTaskResResponse {
    #[prost(message, repeated, tag = "1")]
    pub task_res_list: ::prost::alloc::vec::Vec<TaskRes>,
}

/// Client implementation for the worker-facing Fleet service.
pub mod fleet_client {
    use tonic::codegen::http::uri::PathAndQuery;
    use tonic::codegen::*;

    #[derive(Debug, Clone)]
    pub struct FleetClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl FleetClient<tonic::transport::Channel> {
        /// Attempt to create a new client by connecting to a given endpoint.
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }

    impl<T> FleetClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }

        async fn ready(&mut self) -> Result<(), tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })
        }

        pub async fn create_node(
            &mut self,
            request: impl tonic::IntoRequest<super::CreateNodeRequest>,
        ) -> Result<tonic::Response<super::CreateNodeResponse>, tonic::Status> {
            self.ready().await?;
            let codec = tonic::codec::ProstCodec::default();
            let path = PathAndQuery::from_static("/fedlink.Fleet/CreateNode");
            self.inner.unary(request.into_request(), path, codec).await
        }

        pub async fn delete_node(
            &mut self,
            request: impl tonic::IntoRequest<super::DeleteNodeRequest>,
        ) -> Result<tonic::Response<super::DeleteNodeResponse>, tonic::Status> {
            self.ready().await?;
            let codec = tonic::codec::ProstCodec::default();
            let path = PathAndQuery::from_static("/fedlink.Fleet/DeleteNode");
            self.inner.unary(request.into_request(), path, codec).await
        }

        pub async fn pull_task_ins(
            &mut self,
            request: impl tonic::IntoRequest<super::PullTaskInsRequest>,
        ) -> Result<tonic::Response<super::PullTaskInsResponse>, tonic::Status> {
            self.ready().await?;
            let codec = tonic::codec::ProstCodec::default();
            let path = PathAndQuery::from_static("/fedlink.Fleet/PullTaskIns");
            self.inner.unary(request.into_request(), path, codec).await
        }

        pub async fn push_task_res(
            &mut self,
            request: impl tonic::IntoRequest<super::PushTaskResRequest>,
        ) -> Result<tonic::Response<super::PushTaskResResponse>, tonic::Status> {
            self.ready().await?;
            let codec = tonic::codec::ProstCodec::default();
            let path = PathAndQuery::from_static("/fedlink.Fleet/PushTaskRes");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
}

/// Server implementation for the worker-facing Fleet service.
pub mod fleet_server {
    use tonic::codegen::*;

    /// Methods a Fleet service implementation must provide.
    #[async_trait]
    pub trait Fleet: Send + Sync + 'static {
        async fn create_node(
            &self,
            request: tonic::Request<super::CreateNodeRequest>,
        ) -> Result<tonic::Response<super::CreateNodeResponse>, tonic::Status>;

        async fn delete_node(
            &self,
            request: tonic::Request<super::DeleteNodeRequest>,
        ) -> Result<tonic::Response<super::DeleteNodeResponse>, tonic::Status>;

        async fn pull_task_ins(
            &self,
            request: tonic::Request<super::PullTaskInsRequest>,
        ) -> Result<tonic::Response<super::PullTaskInsResponse>, tonic::Status>;

        async fn push_task_res(
            &self,
            request: tonic::Request<super::PushTaskResRequest>,
        ) -> Result<tonic::Response<super::PushTaskResResponse>, tonic::Status>;
    }

    #[derive(Debug)]
    pub struct FleetServer<T: Fleet> {
        inner: Arc<T>,
    }

    impl<T: Fleet> FleetServer<T> {
        pub fn new(inner: T) -> Self {
            Self::from_arc(Arc::new(inner))
        }

        pub fn from_arc(inner: Arc<T>) -> Self {
            Self { inner }
        }
    }

    impl<T: Fleet> Clone for FleetServer<T> {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl<T, B> tonic::codegen::Service<http::Request<B>> for FleetServer<T>
    where
        T: Fleet,
        B: Body + Send + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = std::convert::Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = Arc::clone(&self.inner);
            match req.uri().path() {
                "/fedlink.Fleet/CreateNode" => {
                    struct CreateNodeSvc<T: Fleet>(Arc<T>);
                    impl<T: Fleet> tonic::server::UnaryService<super::CreateNodeRequest> for CreateNodeSvc<T> {
                        type Response = super::CreateNodeResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::CreateNodeRequest>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            Box::pin(async move { inner.create_node(request).await })
                        }
                    }
                    Box::pin(async move {
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        Ok(grpc.unary(CreateNodeSvc(inner), req).await)
                    })
                }
                "/fedlink.Fleet/DeleteNode" => {
                    struct DeleteNodeSvc<T: Fleet>(Arc<T>);
                    impl<T: Fleet> tonic::server::UnaryService<super::DeleteNodeRequest> for DeleteNodeSvc<T> {
                        type Response = super::DeleteNodeResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::DeleteNodeRequest>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            Box::pin(async move { inner.delete_node(request).await })
                        }
                    }
                    Box::pin(async move {
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        Ok(grpc.unary(DeleteNodeSvc(inner), req).await)
                    })
                }
                "/fedlink.Fleet/PullTaskIns" => {
                    struct PullTaskInsSvc<T: Fleet>(Arc<T>);
                    impl<T: Fleet> tonic::server::UnaryService<super::PullTaskInsRequest> for PullTaskInsSvc<T> {
                        type Response = super::PullTaskInsResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::PullTaskInsRequest>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            Box::pin(async move { inner.pull_task_ins(request).await })
                        }
                    }
                    Box::pin(async move {
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        Ok(grpc.unary(PullTaskInsSvc(inner), req).await)
                    })
                }
                "/fedlink.Fleet/PushTaskRes" => {
                    struct PushTaskResSvc<T: Fleet>(Arc<T>);
                    impl<T: Fleet> tonic::server::UnaryService<super::PushTaskResRequest> for PushTaskResSvc<T> {
                        type Response = super::PushTaskResResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::PushTaskResRequest>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            Box::pin(async move { inner.push_task_res(request).await })
                        }
                    }
                    Box::pin(async move {
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        Ok(grpc.unary(PushTaskResSvc(inner), req).await)
                    })
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(empty_body())
                        .unwrap())
                }),
            }
        }
    }

    impl<T: Fleet> tonic::server::NamedService for FleetServer<T> {
        const NAME: &'static str = "fedlink.Fleet";
    }
}

/// Client implementation for the registry-facing Driver service.
pub mod driver_client {
    use tonic::codegen::http::uri::PathAndQuery;
    use tonic::codegen::*;

    #[derive(Debug, Clone)]
    pub struct DriverClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl DriverClient<tonic::transport::Channel> {
        /// Attempt to create a new client by connecting to a given endpoint.
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }

    impl<T> DriverClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }

        async fn ready(&mut self) -> Result<(), tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })
        }

        pub async fn create_run(
            &mut self,
            request: impl tonic::IntoRequest<super::CreateRunRequest>,
        ) -> Result<tonic::Response<super::CreateRunResponse>, tonic::Status> {
            self.ready().await?;
            let codec = tonic::codec::ProstCodec::default();
            let path = PathAndQuery::from_static("/fedlink.Driver/CreateRun");
            self.inner.unary(request.into_request(), path, codec).await
        }

        pub async fn get_nodes(
            &mut self,
            request: impl tonic::IntoRequest<super::GetNodesRequest>,
        ) -> Result<tonic::Response<super::GetNodesResponse>, tonic::Status> {
            self.ready().await?;
            let codec = tonic::codec::ProstCodec::default();
            let path = PathAndQuery::from_static("/fedlink.Driver/GetNodes");
            self.inner.unary(request.into_request(), path, codec).await
        }

        pub async fn push_task_ins(
            &mut self,
            request: impl tonic::IntoRequest<super::PushTaskInsRequest>,
        ) -> Result<tonic::Response<super::PushTaskInsResponse>, tonic::Status> {
            self.ready().await?;
            let codec = tonic::codec::ProstCodec::default();
            let path = PathAndQuery::from_static("/fedlink.Driver/PushTaskIns");
            self.inner.unary(request.into_request(), path, codec).await
        }

        pub async fn pull_task_res(
            &mut self,
            request: impl tonic::IntoRequest<super::PullTaskResRequest>,
        ) -> Result<tonic::Response<super::PullTaskResResponse>, tonic::Status> {
            self.ready().await?;
            let codec = tonic::codec::ProstCodec::default();
            let path = PathAndQuery::from_static("/fedlink.Driver/PullTaskRes");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
}

/// Server implementation for the registry-facing Driver service.
pub mod driver_server {
    use tonic::codegen::*;

    /// Methods a Driver service implementation must provide.
    #[async_trait]
    pub trait Driver: Send + Sync + 'static {
        async fn create_run(
            &self,
            request: tonic::Request<super::CreateRunRequest>,
        ) -> Result<tonic::Response<super::CreateRunResponse>, tonic::Status>;

        async fn get_nodes(
            &self,
            request: tonic::Request<super::GetNodesRequest>,
        ) -> Result<tonic::Response<super::GetNodesResponse>, tonic::Status>;

        async fn push_task_ins(
            &self,
            request: tonic::Request<super::PushTaskInsRequest>,
        ) -> Result<tonic::Response<super::PushTaskInsResponse>, tonic::Status>;

        async fn pull_task_res(
            &self,
            request: tonic::Request<super::PullTaskResRequest>,
        ) -> Result<tonic::Response<super::PullTaskResResponse>, tonic::Status>;
    }

    #[derive(Debug)]
    pub struct DriverServer<T: Driver> {
        inner: Arc<T>,
    }

    impl<T: Driver> DriverServer<T> {
        pub fn new(inner: T) -> Self {
            Self::from_arc(Arc::new(inner))
        }

        pub fn from_arc(inner: Arc<T>) -> Self {
            Self { inner }
        }
    }

    impl<T: Driver> Clone for DriverServer<T> {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl<T, B> tonic::codegen::Service<http::Request<B>> for DriverServer<T>
    where
        T: Driver,
        B: Body + Send + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = std::convert::Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = Arc::clone(&self.inner);
            match req.uri().path() {
                "/fedlink.Driver/CreateRun" => {
                    struct CreateRunSvc<T: Driver>(Arc<T>);
                    impl<T: Driver> tonic::server::UnaryService<super::CreateRunRequest> for CreateRunSvc<T> {
                        type Response = super::CreateRunResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::CreateRunRequest>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            Box::pin(async move { inner.create_run(request).await })
                        }
                    }
                    Box::pin(async move {
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        Ok(grpc.unary(CreateRunSvc(inner), req).await)
                    })
                }
                "/fedlink.Driver/GetNodes" => {
                    struct GetNodesSvc<T: Driver>(Arc<T>);
                    impl<T: Driver> tonic::server::UnaryService<super::GetNodesRequest> for GetNodesSvc<T> {
                        type Response = super::GetNodesResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::GetNodesRequest>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            Box::pin(async move { inner.get_nodes(request).await })
                        }
                    }
                    Box::pin(async move {
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        Ok(grpc.unary(GetNodesSvc(inner), req).await)
                    })
                }
                "/fedlink.Driver/PushTaskIns" => {
                    struct PushTaskInsSvc<T: Driver>(Arc<T>);
                    impl<T: Driver> tonic::server::UnaryService<super::PushTaskInsRequest> for PushTaskInsSvc<T> {
                        type Response = super::PushTaskInsResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::PushTaskInsRequest>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            Box::pin(async move { inner.push_task_ins(request).await })
                        }
                    }
                    Box::pin(async move {
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        Ok(grpc.unary(PushTaskInsSvc(inner), req).await)
                    })
                }
                "/fedlink.Driver/PullTaskRes" => {
                    struct PullTaskResSvc<T: Driver>(Arc<T>);
                    impl<T: Driver> tonic::server::UnaryService<super::PullTaskResRequest> for PullTaskResSvc<T> {
                        type Response = super::PullTaskResResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::PullTaskResRequest>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            Box::pin(async move { inner.pull_task_res(request).await })
                        }
                    }
                    Box::pin(async move {
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        Ok(grpc.unary(PullTaskResSvc(inner), req).await)
                    })
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(empty_body())
                        .unwrap())
                }),
            }
        }
    }

    impl<T: Driver> tonic::server::NamedService for DriverServer<T> {
        const NAME: &'static str = "fedlink.Driver";
    }
}

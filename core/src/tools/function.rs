use crate::schema::{Arguments, Signature};
use crate::traits::Tool;
use async_trait::async_trait;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::fmt::Display;
use std::future::Future;

type Handler = Box<dyn Fn(Arguments) -> BoxFuture<'static, anyhow::Result<String>> + Send + Sync>;

/// A tool backed by a closure. The closure receives coerced arguments and
/// may return anything printable; the output is stringified for the model.
pub struct FunctionTool {
    signature: Signature,
    handler: Handler,
}

impl FunctionTool {
    pub fn new<F, Fut, R>(signature: Signature, handler: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Display + Send + 'static,
    {
        Self {
            signature,
            handler: Box::new(move |args| {
                let fut = handler(args);
                async move { fut.await.map(|out| out.to_string()) }.boxed()
            }),
        }
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn signature(&self) -> Signature {
        self.signature.clone()
    }

    async fn call(&self, args: Arguments) -> anyhow::Result<String> {
        (self.handler)(args).await
    }
}

use async_trait::async_trait;
use aws_sdk_apigatewaymanagement::error::DisplayErrorContext;
use aws_sdk_apigatewaymanagement::primitives::Blob;
use ws_broadcast_core::dispatch::PushGateway;
use ws_broadcast_core::error::DeliveryError;

/// API Gateway Management client bound to one WebSocket API stage.
#[derive(Clone)]
pub struct ApiGatewayPushGateway {
    client: aws_sdk_apigatewaymanagement::Client,
}

impl ApiGatewayPushGateway {
    /// `endpoint` is the `https://` form of the WebSocket stage URL.
    pub fn new(sdk_config: &aws_config::SdkConfig, endpoint: &str) -> Self {
        let config = aws_sdk_apigatewaymanagement::config::Builder::from(sdk_config)
            .endpoint_url(endpoint)
            .build();
        Self {
            client: aws_sdk_apigatewaymanagement::Client::from_conf(config),
        }
    }
}

#[async_trait]
impl PushGateway for ApiGatewayPushGateway {
    async fn post_to_connection(
        &self,
        connection_id: &str,
        payload: &[u8],
    ) -> Result<(), DeliveryError> {
        self.client
            .post_to_connection()
            .connection_id(connection_id)
            .data(Blob::new(payload))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| {
                let gone = error
                    .as_service_error()
                    .is_some_and(|service_error| service_error.is_gone_exception());
                if gone {
                    DeliveryError::Gone(connection_id.to_string())
                } else {
                    DeliveryError::Service {
                        connection_id: connection_id.to_string(),
                        message: DisplayErrorContext(&error).to_string(),
                    }
                }
            })
    }
}

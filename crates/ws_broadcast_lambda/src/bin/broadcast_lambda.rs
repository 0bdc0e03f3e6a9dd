use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::info;
use ws_broadcast_lambda::adapters::dynamodb::DynamoConnectionStore;
use ws_broadcast_lambda::adapters::gateway::ApiGatewayPushGateway;
use ws_broadcast_lambda::adapters::sqs::SqsMessageQueue;
use ws_broadcast_lambda::config::BroadcastConfig;
use ws_broadcast_lambda::handlers::broadcast::{handle_queue_event, BroadcastHandlerConfig};
use ws_broadcast_lambda::handlers::response::ApiGatewayResponse;
use ws_broadcast_lambda::telemetry::init_tracing;

struct RuntimeDependencies {
    config: BroadcastHandlerConfig,
    store: DynamoConnectionStore,
    queue: SqsMessageQueue,
    gateway: ApiGatewayPushGateway,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<ApiGatewayResponse, Error> {
    Ok(handle_queue_event(
        event.payload,
        &deps.config,
        &deps.store,
        &deps.queue,
        &deps.gateway,
    )
    .await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = BroadcastConfig::from_env().map_err(|error| Error::from(error.to_string()))?;
    let endpoint = config
        .gateway_endpoint()
        .map_err(|error| Error::from(error.to_string()))?;
    let sdk_config = config.load_sdk_config().await;

    let deps = RuntimeDependencies {
        config: BroadcastHandlerConfig::from(&config),
        store: DynamoConnectionStore::new(aws_sdk_dynamodb::Client::new(&sdk_config)),
        queue: SqsMessageQueue::new(aws_sdk_sqs::Client::new(&sdk_config)),
        gateway: ApiGatewayPushGateway::new(&sdk_config, &endpoint),
    };
    info!(
        component = "broadcast_lambda",
        table = deps.config.table_name.as_str(),
        endpoint = endpoint.as_str(),
        "broadcast runtime ready"
    );

    let deps = &deps;
    lambda_runtime::run(service_fn(move |event| handle_request(event, deps))).await
}

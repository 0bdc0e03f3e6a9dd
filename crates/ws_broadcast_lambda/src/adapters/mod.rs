pub mod dynamodb;
pub mod gateway;
pub mod sqs;

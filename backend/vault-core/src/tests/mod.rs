mod dispatcher;
mod error;
mod logger;
mod protocol;
mod worker;

//! Infrastructure layer: document store and payment provider adapters.

pub mod payments;
pub mod store;

pub use payments::{InMemoryPaymentGateway, PaymentError, PaymentGateway, PaymentIntent, StripeGateway};
pub use store::{
    DeleteResult, InMemoryStore, InsertResult, PaymentStore, PostgresStore, ReviewStore, StoreError,
    StoreResult, TaskStore, UpdateResult, UpsertOutcome, UserDirectory, UserStore,
};

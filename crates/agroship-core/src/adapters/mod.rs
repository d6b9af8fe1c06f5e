mod courier_api;

pub use courier_api::CourierApiAdapter;

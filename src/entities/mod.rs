pub mod branch;
pub mod category;
pub mod chat_message;
pub mod company;
pub mod customer;
pub mod franchise_application;
pub mod order;
pub mod order_item;
pub mod product;
pub mod restaurant_table;
pub mod sales_record;
pub mod sales_record_item;
pub mod table_payment;
pub mod user;
pub mod user_address;

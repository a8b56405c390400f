pub mod jobdtos;
pub mod paymentdtos;
pub mod reviewdtos;
pub mod userdtos;

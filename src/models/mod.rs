pub mod chatmodel;
pub mod jobmodel;
pub mod usermodel;

pub mod price_list;
pub mod sample_request;
pub mod states;
pub mod track;

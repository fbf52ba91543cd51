pub mod outpass;

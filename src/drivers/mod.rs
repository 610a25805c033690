pub mod gt911;

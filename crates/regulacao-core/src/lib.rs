pub mod coerce;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod fila;
pub mod unidades;

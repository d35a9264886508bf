//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format
//!
//! ### Request
//! UTF-8 text, fields separated by `|`, keyword first:
//! ```text
//! AGREGAR|S1|Ana|Math|18
//! ```
//!
//! ### Commands
//! - `AGREGAR|id|name|subject|grade` - insert a grade
//! - `BUSCAR|id`                     - all grades of a student
//! - `ACTUALIZAR|id|subject|grade`   - change one grade
//! - `LISTAR`                        - the whole table
//! - `ELIMINAR|id`                   - remove a student
//! - `VERIFICAR_ID|id`               - is the id taken?
//!
//! ### Response
//! One JSON object with `status` (`ok`, `error`, `not_found`) plus
//! `mensaje`, `data` and/or `count`.

mod codec;
mod command;
mod response;

pub use codec::{
    decode_request, decode_response, encode_response, read_request, read_response,
    write_request, write_response,
};
pub(crate) use codec::is_timeout;
pub use command::{Command, CommandType, SEPARATOR};
pub use response::{Response, Status};

mod buf;

pub(crate) use buf::Buf;

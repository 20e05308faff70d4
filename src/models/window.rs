use std::fmt;

/// Непрозрачный идентификатор окна верхнего уровня.
///
/// Хранит сырое значение HWND как `isize`, чтобы тип оставался `Send + Sync`
/// и мог жить в множествах. Окном не владеет: каждый опрос разрешает его заново.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowHandle(isize);

impl WindowHandle {
    pub fn from_raw(raw: isize) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> isize {
        self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.raw())
    }
}

//! Thin wrappers over the Accessibility (AX) C API.

use std::{cell::RefCell, collections::HashMap, ffi::c_void, ptr, thread_local};

use core_foundation::{
    array::{CFArray, CFArrayGetCount, CFArrayGetValueAtIndex},
    base::{CFRelease, CFRetain, CFTypeRef, TCFType},
    boolean::{kCFBooleanFalse, kCFBooleanTrue},
    string::{CFString, CFStringRef},
};
use topmost_core::{AccessError, AccessResult, Attribute, Point, Size};

#[link(name = "ApplicationServices", kind = "framework")]
unsafe extern "C" {
    fn AXUIElementCreateApplication(pid: i32) -> *mut c_void;
    fn AXUIElementCopyAttributeValue(
        element: *mut c_void,
        attr: CFStringRef,
        value: *mut CFTypeRef,
    ) -> i32;
    fn AXUIElementSetAttributeValue(element: *mut c_void, attr: CFStringRef, value: CFTypeRef)
    -> i32;
    fn AXUIElementPerformAction(element: *mut c_void, action: CFStringRef) -> i32;
    fn AXValueCreate(the_type: i32, value_ptr: *const c_void) -> CFTypeRef;
    fn AXValueGetValue(the_value: CFTypeRef, the_type: i32, value_ptr: *mut c_void) -> bool;
}

#[link(name = "CoreFoundation", kind = "framework")]
unsafe extern "C" {
    fn CFBooleanGetValue(b: CFTypeRef) -> bool;
    fn CFBooleanGetTypeID() -> usize;
    fn CFGetTypeID(cf: CFTypeRef) -> usize;
}

/// `kAXValueCGPointType`.
const K_AX_VALUE_CGPOINT_TYPE: i32 = 1;
/// `kAXValueCGSizeType`.
const K_AX_VALUE_CGSIZE_TYPE: i32 = 2;
/// `kAXErrorInvalidUIElement`: the element was destroyed.
const K_AX_ERROR_INVALID_UI_ELEMENT: i32 = -25202;
/// `kAXErrorAPIDisabled`: the process is not trusted.
const K_AX_ERROR_API_DISABLED: i32 = -25211;
/// `kAXErrorNoValue`: the attribute exists but is unset.
const K_AX_ERROR_NO_VALUE: i32 = -25212;

thread_local! {
    static ATTR_STRINGS: RefCell<HashMap<&'static str, CFString>> = RefCell::new(HashMap::new());
}

/// Stable CFStringRef for an attribute or action name, cached per thread.
pub fn cfstr(name: &'static str) -> CFStringRef {
    ATTR_STRINGS.with(|cell| {
        let mut m = cell.borrow_mut();
        let s = m.entry(name).or_insert_with(|| CFString::new(name));
        s.as_concrete_TypeRef()
    })
}

/// AX attribute name for a core attribute.
pub fn attr_name(attr: Attribute) -> &'static str {
    match attr {
        Attribute::Frontmost => "AXFrontmost",
        Attribute::Main => "AXMain",
        Attribute::Position => "AXPosition",
        Attribute::Size => "AXSize",
    }
}

/// CGPoint layout for AXValue conversion.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct CGPoint {
    /// Horizontal coordinate.
    x: f64,
    /// Vertical coordinate.
    y: f64,
}

/// CGSize layout for AXValue conversion.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct CGSize {
    /// Width.
    width: f64,
    /// Height.
    height: f64,
}

/// Owned AX element, released on drop.
pub struct AXElem(*mut c_void);

impl AXElem {
    /// Take ownership of a +1 reference; `None` for null.
    ///
    /// # Safety
    /// `ptr` must be null or a retained AXUIElementRef.
    pub unsafe fn from_create(ptr: *mut c_void) -> Option<Self> {
        if ptr.is_null() { None } else { Some(Self(ptr)) }
    }

    /// Retain a borrowed reference.
    ///
    /// # Safety
    /// `ptr` must be a valid AXUIElementRef.
    unsafe fn retain(ptr: *mut c_void) -> Self {
        unsafe { CFRetain(ptr as CFTypeRef) };
        Self(ptr)
    }

    /// Raw pointer for FFI calls.
    pub fn as_ptr(&self) -> *mut c_void {
        self.0
    }

    /// Application element for `pid`.
    pub fn application(pid: i32) -> AccessResult<Self> {
        // SAFETY: AXUIElementCreateApplication returns a +1 reference or null.
        unsafe { Self::from_create(AXUIElementCreateApplication(pid)) }
            .ok_or(AccessError::NoAccessibleWindow)
    }

    /// Copy an element-valued attribute (`AXFocusedWindow`, `AXMainWindow`).
    pub fn child(&self, name: &'static str) -> AccessResult<Self> {
        let v = copy_raw(self, name)?;
        // SAFETY: the copied value is a +1 AXUIElementRef.
        unsafe { Self::from_create(v as *mut c_void) }.ok_or(AccessError::NoAccessibleWindow)
    }

    /// First element of an array-valued attribute (`AXWindows`).
    pub fn first_of(&self, name: &'static str) -> AccessResult<Self> {
        let v = copy_raw(self, name)?;
        // SAFETY: the copied value is a +1 CFArray of AXUIElementRefs.
        let arr = unsafe { CFArray::<*const c_void>::wrap_under_create_rule(v as _) };
        let n = unsafe { CFArrayGetCount(arr.as_concrete_TypeRef()) };
        if n == 0 {
            return Err(AccessError::NoAccessibleWindow);
        }
        let w = unsafe { CFArrayGetValueAtIndex(arr.as_concrete_TypeRef(), 0) } as *mut c_void;
        if w.is_null() {
            return Err(AccessError::NoAccessibleWindow);
        }
        // SAFETY: array entries are borrowed; retain before the array drops.
        Ok(unsafe { Self::retain(w) })
    }
}

impl Drop for AXElem {
    fn drop(&mut self) {
        unsafe { CFRelease(self.0 as CFTypeRef) };
    }
}

/// Map an AX status code for a read.
fn read_err(attr: Attribute, code: i32) -> AccessError {
    match code {
        K_AX_ERROR_INVALID_UI_ELEMENT => AccessError::WindowGone,
        K_AX_ERROR_API_DISABLED => AccessError::PermissionDenied,
        code => AccessError::AttributeReadFailed {
            attribute: attr,
            code,
        },
    }
}

/// Map an AX status code for a write.
fn write_err(attr: Attribute, code: i32) -> AccessError {
    match code {
        K_AX_ERROR_INVALID_UI_ELEMENT => AccessError::WindowGone,
        K_AX_ERROR_API_DISABLED => AccessError::PermissionDenied,
        code => AccessError::AttributeWriteFailed {
            attribute: attr,
            code,
        },
    }
}

/// Copy an attribute value as a +1 CFTypeRef.
fn copy_raw(elem: &AXElem, name: &'static str) -> AccessResult<CFTypeRef> {
    let mut v: CFTypeRef = ptr::null_mut();
    let err = unsafe { AXUIElementCopyAttributeValue(elem.as_ptr(), cfstr(name), &mut v) };
    match err {
        0 if !v.is_null() => Ok(v),
        0 | K_AX_ERROR_NO_VALUE => Err(AccessError::NoAccessibleWindow),
        K_AX_ERROR_INVALID_UI_ELEMENT => Err(AccessError::WindowGone),
        K_AX_ERROR_API_DISABLED => Err(AccessError::PermissionDenied),
        _ => Err(AccessError::NoAccessibleWindow),
    }
}

/// Copy an attribute for a typed read.
fn copy_attr(elem: &AXElem, attr: Attribute) -> AccessResult<CFTypeRef> {
    let mut v: CFTypeRef = ptr::null_mut();
    let err = unsafe { AXUIElementCopyAttributeValue(elem.as_ptr(), cfstr(attr_name(attr)), &mut v) };
    if err != 0 {
        return Err(read_err(attr, err));
    }
    if v.is_null() {
        return Err(AccessError::Unsupported);
    }
    Ok(v)
}

/// Interpret `v` as a CFBoolean; any other CF type is unsupported.
///
/// # Safety
/// `v` must be a valid CFTypeRef.
unsafe fn bool_value(v: CFTypeRef) -> AccessResult<bool> {
    if unsafe { CFGetTypeID(v) != CFBooleanGetTypeID() } {
        return Err(AccessError::Unsupported);
    }
    Ok(unsafe { CFBooleanGetValue(v) })
}

/// Read a boolean attribute.
pub fn get_bool(elem: &AXElem, attr: Attribute) -> AccessResult<bool> {
    let v = copy_attr(elem, attr)?;
    // SAFETY: `v` is a +1 value from copy_attr, released below.
    let b = unsafe { bool_value(v) };
    unsafe { CFRelease(v) };
    b
}

/// Write a boolean attribute.
pub fn set_bool(elem: &AXElem, attr: Attribute, value: bool) -> AccessResult<()> {
    let val = unsafe {
        (if value {
            kCFBooleanTrue
        } else {
            kCFBooleanFalse
        }) as CFTypeRef
    };
    let err = unsafe { AXUIElementSetAttributeValue(elem.as_ptr(), cfstr(attr_name(attr)), val) };
    if err != 0 {
        return Err(write_err(attr, err));
    }
    Ok(())
}

/// Read a point attribute.
pub fn get_point(elem: &AXElem, attr: Attribute) -> AccessResult<Point> {
    let v = copy_attr(elem, attr)?;
    let mut p = CGPoint::default();
    let ok =
        unsafe { AXValueGetValue(v, K_AX_VALUE_CGPOINT_TYPE, &mut p as *mut _ as *mut c_void) };
    unsafe { CFRelease(v) };
    if !ok {
        return Err(AccessError::Unsupported);
    }
    Ok(Point { x: p.x, y: p.y })
}

/// Read a size attribute.
pub fn get_size(elem: &AXElem, attr: Attribute) -> AccessResult<Size> {
    let v = copy_attr(elem, attr)?;
    let mut s = CGSize::default();
    let ok = unsafe { AXValueGetValue(v, K_AX_VALUE_CGSIZE_TYPE, &mut s as *mut _ as *mut c_void) };
    unsafe { CFRelease(v) };
    if !ok {
        return Err(AccessError::Unsupported);
    }
    Ok(Size {
        width: s.width,
        height: s.height,
    })
}

/// Write an AXValue built from `value` of AX type `ty`.
fn set_value<T>(elem: &AXElem, attr: Attribute, ty: i32, value: &T) -> AccessResult<()> {
    let v = unsafe { AXValueCreate(ty, value as *const T as *const c_void) };
    if v.is_null() {
        return Err(AccessError::Unsupported);
    }
    let err = unsafe { AXUIElementSetAttributeValue(elem.as_ptr(), cfstr(attr_name(attr)), v) };
    unsafe { CFRelease(v) };
    if err != 0 {
        return Err(write_err(attr, err));
    }
    Ok(())
}

/// Write a point attribute.
pub fn set_point(elem: &AXElem, attr: Attribute, p: Point) -> AccessResult<()> {
    let p = CGPoint { x: p.x, y: p.y };
    set_value(elem, attr, K_AX_VALUE_CGPOINT_TYPE, &p)
}

/// Write a size attribute.
pub fn set_size(elem: &AXElem, attr: Attribute, s: Size) -> AccessResult<()> {
    let s = CGSize {
        width: s.width,
        height: s.height,
    };
    set_value(elem, attr, K_AX_VALUE_CGSIZE_TYPE, &s)
}

/// Perform the `AXRaise` action.
pub fn raise(elem: &AXElem) -> AccessResult<()> {
    let err = unsafe { AXUIElementPerformAction(elem.as_ptr(), cfstr("AXRaise")) };
    match err {
        0 => Ok(()),
        K_AX_ERROR_INVALID_UI_ELEMENT => Err(AccessError::WindowGone),
        code => Err(AccessError::RaiseFailed { code }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_are_read() {
        let (t, f) = unsafe { (kCFBooleanTrue as CFTypeRef, kCFBooleanFalse as CFTypeRef) };
        assert_eq!(unsafe { bool_value(t) }, Ok(true));
        assert_eq!(unsafe { bool_value(f) }, Ok(false));
    }

    #[test]
    fn non_boolean_value_is_unsupported() {
        let s = CFString::new("AXMain");
        let v = s.as_concrete_TypeRef() as CFTypeRef;
        assert_eq!(unsafe { bool_value(v) }, Err(AccessError::Unsupported));
    }
}

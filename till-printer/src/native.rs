//! Win32 spooler access
//!
//! Raw queue enumeration and RAW-datatype print jobs through the Win32
//! printing API. Windows only.

use core::ffi::c_void;

use windows::Win32::Graphics::Printing::{
    ClosePrinter, DOC_INFO_1W, EndDocPrinter, EndPagePrinter, EnumPrintersW, OpenPrinterW,
    PRINTER_ENUM_CONNECTIONS, PRINTER_ENUM_LOCAL, PRINTER_HANDLE, PRINTER_INFO_4W,
    StartDocPrinterW, StartPagePrinter, WritePrinter,
};
use windows::core::{PCWSTR, PWSTR};

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Names of all local and connected queues, unfiltered
pub fn list_queues() -> Result<Vec<String>, String> {
    unsafe {
        let flags = PRINTER_ENUM_LOCAL | PRINTER_ENUM_CONNECTIONS;
        let mut needed: u32 = 0;
        let mut returned: u32 = 0;

        let _ = EnumPrintersW(flags, None, 4, None, &mut needed, &mut returned);

        if needed == 0 {
            return Ok(Vec::new());
        }

        let mut buf: Vec<u8> = vec![0; needed as usize];
        EnumPrintersW(
            flags,
            None,
            4,
            Some(buf.as_mut_slice()),
            &mut needed,
            &mut returned,
        )
        .map_err(|e| format!("EnumPrintersW failed: {}", e))?;

        let ptr = buf.as_ptr() as *const PRINTER_INFO_4W;
        let slice = std::slice::from_raw_parts(ptr, returned as usize);

        Ok(slice
            .iter()
            .filter(|info| !info.pPrinterName.is_null())
            .filter_map(|info| PWSTR(info.pPrinterName.0).to_string().ok())
            .collect())
    }
}

/// Submit `data` to queue `name` as a single RAW job
pub fn write_raw(name: &str, data: &[u8]) -> Result<(), String> {
    unsafe {
        let mut handle: PRINTER_HANDLE = PRINTER_HANDLE::default();
        let name_w = to_wide(name);

        OpenPrinterW(PCWSTR::from_raw(name_w.as_ptr()), &mut handle, None)
            .map_err(|e| format!("OpenPrinterW failed: {}", e))?;

        let doc_name_w = to_wide("Receipt");
        let datatype_w = to_wide("RAW");
        let doc_info = DOC_INFO_1W {
            pDocName: PWSTR(doc_name_w.as_ptr() as *mut _),
            pOutputFile: PWSTR::null(),
            pDatatype: PWSTR(datatype_w.as_ptr() as *mut _),
        };

        if StartDocPrinterW(handle, 1, &doc_info as *const DOC_INFO_1W) == 0 {
            let _ = ClosePrinter(handle);
            return Err("StartDocPrinter failed".to_string());
        }

        if !StartPagePrinter(handle).as_bool() {
            let _ = EndDocPrinter(handle);
            let _ = ClosePrinter(handle);
            return Err("StartPagePrinter failed".to_string());
        }

        let mut written: u32 = 0;
        let ok = WritePrinter(
            handle,
            data.as_ptr() as *const c_void,
            data.len() as u32,
            &mut written,
        );

        let _ = EndPagePrinter(handle);
        let _ = EndDocPrinter(handle);
        let _ = ClosePrinter(handle);

        if !ok.as_bool() {
            return Err("WritePrinter failed".to_string());
        }

        if written != data.len() as u32 {
            return Err("Incomplete write".to_string());
        }

        Ok(())
    }
}
